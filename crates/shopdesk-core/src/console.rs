// ── Console facade ──
//
// One HTTP client and one query cache per backend; every resource
// screen gets its hooks and list controller from here so they all
// share the same cache.

use std::sync::Arc;

use shopdesk_api::{ApiClient, QueryParams, ResourceClient};
use tracing::debug;

use crate::cache::QueryCache;
use crate::config::ConsoleConfig;
use crate::error::CoreError;
use crate::hooks::ResourceHooks;
use crate::list::ResourceList;
use crate::notify::Notifier;
use crate::resource::Resource;
use crate::table::TableController;

#[derive(Debug, Clone)]
pub struct Console {
    api: ApiClient,
    cache: QueryCache,
    page_size: u32,
}

impl Console {
    pub fn new(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.api_url.as_str(), &config.transport())
            .map_err(|e| CoreError::from_api(e, "console", None))?;
        debug!(url = %config.api_url, "console ready");
        Ok(Self {
            api,
            cache: QueryCache::new(config.stale_time),
            page_size: config.page_size,
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Hooks for resource `name` backed by HTTP.
    pub fn hooks<T: Resource>(&self, name: &str) -> ResourceHooks<T, ResourceClient<T>> {
        ResourceHooks::new(self.api.resource(name), &self.cache)
    }

    /// List controller for resource `name`, starting from the default
    /// page size with no search or filters.
    pub fn list<T: Resource>(
        &self,
        name: &str,
        table: TableController,
        notifier: Arc<dyn Notifier>,
    ) -> ResourceList<T, ResourceClient<T>> {
        ResourceList::new(
            self.hooks(name),
            table,
            QueryParams::new(self.page_size),
            notifier,
        )
    }
}
