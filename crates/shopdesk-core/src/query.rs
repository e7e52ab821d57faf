// ── Resource query hooks ──
//
// Cached reads for one resource. Keys are structural, so two callers
// asking for equal params share a cache slot and an in-flight request.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use shopdesk_api::{OptionItem, PaginatedResult, QueryParams};

use crate::cache::{Cached, QueryCache, QueryKey};
use crate::error::CoreError;
use crate::resource::{Resource, ResourceBackend};

pub struct ResourceQueries<T, B> {
    backend: Arc<B>,
    cache: QueryCache,
    _record: PhantomData<fn() -> T>,
}

impl<T, B> Clone for ResourceQueries<T, B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cache: self.cache.clone(),
            _record: PhantomData,
        }
    }
}

impl<T, B> fmt::Debug for ResourceQueries<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceQueries").finish_non_exhaustive()
    }
}

impl<T: Resource, B: ResourceBackend<T>> ResourceQueries<T, B> {
    pub fn new(backend: Arc<B>, cache: QueryCache) -> Self {
        Self {
            backend,
            cache,
            _record: PhantomData,
        }
    }

    pub fn resource(&self) -> &str {
        self.backend.name()
    }

    pub fn list_key(&self, params: &QueryParams) -> QueryKey {
        QueryKey::list(self.resource(), params.clone())
    }

    /// One page of records for `params`.
    pub async fn list(&self, params: &QueryParams) -> Result<Arc<PaginatedResult<T>>, CoreError> {
        self.cache
            .fetch(self.list_key(params), || self.backend.list(params))
            .await
    }

    /// Last settled page for `params` without fetching.
    pub fn peek_list(&self, params: &QueryParams) -> Option<Cached<PaginatedResult<T>>> {
        self.cache.peek(&self.list_key(params))
    }

    /// One record by id. An absent or empty id disables the query: no
    /// request is made and `Ok(None)` is returned.
    pub async fn get(&self, id: Option<&str>) -> Result<Option<Arc<T>>, CoreError> {
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let key = QueryKey::detail(self.resource(), id);
        self.cache
            .fetch(key, || self.backend.get(id))
            .await
            .map(Some)
    }

    /// Dropdown `{id, label}` pairs, optionally scoped to a parent.
    pub async fn options(&self, parent_id: Option<&str>) -> Result<Arc<Vec<OptionItem>>, CoreError> {
        let key = QueryKey::options(self.resource(), parent_id);
        self.cache
            .fetch(key, || self.backend.options(parent_id))
            .await
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}
