use std::fmt;
use std::sync::Arc;

use crate::cache::QueryCache;
use crate::mutation::ResourceMutations;
use crate::query::ResourceQueries;
use crate::resource::{Resource, ResourceBackend};

/// Reads and writes for one resource, sharing one backend and one cache.
///
/// Built once per resource and handed to every screen that shows it;
/// any number of hook sets may share the same [`QueryCache`].
pub struct ResourceHooks<T, B> {
    pub queries: ResourceQueries<T, B>,
    pub mutations: ResourceMutations<T, B>,
}

impl<T, B> Clone for ResourceHooks<T, B> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            mutations: self.mutations.clone(),
        }
    }
}

impl<T, B> fmt::Debug for ResourceHooks<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHooks")
            .field("mutations", &self.mutations)
            .finish_non_exhaustive()
    }
}

impl<T: Resource, B: ResourceBackend<T>> ResourceHooks<T, B> {
    pub fn new(backend: B, cache: &QueryCache) -> Self {
        let backend = Arc::new(backend);
        Self {
            queries: ResourceQueries::new(Arc::clone(&backend), cache.clone()),
            mutations: ResourceMutations::new(backend, cache.clone()),
        }
    }

    pub fn resource(&self) -> &str {
        self.queries.resource()
    }
}
