// ── Resource descriptor and backend seam ──
//
// `Resource` is the only thing the framework knows about an entity: it
// can be (de)serialized and it may expose an id. `ResourceBackend` is
// the request layer the hooks sit on; `ResourceClient<T>` is the HTTP
// implementation, tests plug in an in-memory one.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shopdesk_api::{MultipartPayload, OptionItem, PaginatedResult, QueryParams, ResourceClient};

use crate::error::CoreError;

/// An entity managed through the resource framework.
pub trait Resource: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable identifier, or `None` while the record has not been created.
    fn id(&self) -> Option<&str>;

    /// Identity comparison: two records are the same resource when both
    /// carry the same non-empty id. Field values are ignored.
    fn same_identity(&self, other: &Self) -> bool {
        match (self.id(), other.id()) {
            (Some(a), Some(b)) => !a.is_empty() && a == b,
            _ => false,
        }
    }
}

/// Request functions for one named resource.
pub trait ResourceBackend<T: Resource>: Send + Sync + 'static {
    /// Resource name, used as the first cache-key segment.
    fn name(&self) -> &str;

    fn list(
        &self,
        params: &QueryParams,
    ) -> impl Future<Output = Result<PaginatedResult<T>, CoreError>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn options(
        &self,
        parent_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<OptionItem>, CoreError>> + Send;

    fn create(&self, data: &Value) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn create_multipart(
        &self,
        payload: MultipartPayload,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn update(&self, id: &str, data: &Value)
    -> impl Future<Output = Result<T, CoreError>> + Send;

    fn update_multipart(
        &self,
        id: &str,
        payload: MultipartPayload,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn bulk_update(
        &self,
        ids: &[String],
        data: &Value,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn bulk_delete(&self, ids: &[String]) -> impl Future<Output = Result<(), CoreError>> + Send;
}

// ── HTTP backend ─────────────────────────────────────────────────────

impl<T: Resource> ResourceBackend<T> for ResourceClient<T> {
    fn name(&self) -> &str {
        ResourceClient::name(self)
    }

    async fn list(&self, params: &QueryParams) -> Result<PaginatedResult<T>, CoreError> {
        ResourceClient::list(self, params)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), None))
    }

    async fn get(&self, id: &str) -> Result<T, CoreError> {
        ResourceClient::get(self, id)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), Some(id)))
    }

    async fn options(&self, parent_id: Option<&str>) -> Result<Vec<OptionItem>, CoreError> {
        ResourceClient::options(self, parent_id)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), None))
    }

    async fn create(&self, data: &Value) -> Result<T, CoreError> {
        ResourceClient::create(self, data)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), None))
    }

    async fn create_multipart(&self, payload: MultipartPayload) -> Result<T, CoreError> {
        ResourceClient::create_multipart(self, payload)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), None))
    }

    async fn update(&self, id: &str, data: &Value) -> Result<T, CoreError> {
        ResourceClient::update(self, id, data)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), Some(id)))
    }

    async fn update_multipart(&self, id: &str, payload: MultipartPayload) -> Result<T, CoreError> {
        ResourceClient::update_multipart(self, id, payload)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), Some(id)))
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        ResourceClient::delete(self, id)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), Some(id)))
    }

    async fn bulk_update(&self, ids: &[String], data: &Value) -> Result<(), CoreError> {
        ResourceClient::bulk_update(self, ids, data)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), None))
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<(), CoreError> {
        ResourceClient::bulk_delete(self, ids)
            .await
            .map_err(|e| CoreError::from_api(e, self.name(), None))
    }
}
