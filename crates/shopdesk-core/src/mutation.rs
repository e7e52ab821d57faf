// ── Resource mutation hooks ──
//
// Writes for one resource. A successful write is the only thing that
// invalidates cache entries, and each operation invalidates exactly the
// partitions it can affect:
//
//   create            lists, options
//   update            lists, options, detail(id)
//   delete            lists, options, detail(id)
//   bulk update       lists, options, detail(each id)   (once per batch)
//   bulk delete       lists, options, detail(each id)   (once per batch)
//
// Failed writes invalidate nothing.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde_json::json;
use shopdesk_api::MultipartPayload;
use tracing::{debug, info, warn};

use crate::cache::{KeyPrefix, QueryCache};
use crate::error::CoreError;
use crate::resource::{Resource, ResourceBackend};

pub struct ResourceMutations<T, B> {
    backend: Arc<B>,
    cache: QueryCache,
    pending: Arc<AtomicUsize>,
    _record: PhantomData<fn() -> T>,
}

impl<T, B> Clone for ResourceMutations<T, B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cache: self.cache.clone(),
            pending: Arc::clone(&self.pending),
            _record: PhantomData,
        }
    }
}

impl<T, B> fmt::Debug for ResourceMutations<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceMutations")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter when the mutation future completes
/// or is dropped.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T: Resource, B: ResourceBackend<T>> ResourceMutations<T, B> {
    pub fn new(backend: Arc<B>, cache: QueryCache) -> Self {
        Self {
            backend,
            cache,
            pending: Arc::new(AtomicUsize::new(0)),
            _record: PhantomData,
        }
    }

    pub fn resource(&self) -> &str {
        self.backend.name()
    }

    /// `true` while any mutation from this set (or a clone) is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    // ── Single-record writes ─────────────────────────────────────────

    pub async fn create<P: Serialize + ?Sized>(&self, data: &P) -> Result<T, CoreError> {
        let body = serde_json::to_value(data)?;
        let _pending = self.begin();
        let created = self.backend.create(&body).await?;
        info!(resource = self.resource(), id = ?created.id(), "created");
        self.invalidate_collections();
        Ok(created)
    }

    pub async fn create_multipart(&self, payload: MultipartPayload) -> Result<T, CoreError> {
        let _pending = self.begin();
        let created = self.backend.create_multipart(payload).await?;
        info!(resource = self.resource(), id = ?created.id(), "created (multipart)");
        self.invalidate_collections();
        Ok(created)
    }

    pub async fn update<P: Serialize + ?Sized>(&self, id: &str, data: &P) -> Result<T, CoreError> {
        let body = serde_json::to_value(data)?;
        let _pending = self.begin();
        let updated = self.backend.update(id, &body).await?;
        info!(resource = self.resource(), id, "updated");
        self.invalidate_records([id]);
        Ok(updated)
    }

    pub async fn update_multipart(
        &self,
        id: &str,
        payload: MultipartPayload,
    ) -> Result<T, CoreError> {
        let _pending = self.begin();
        let updated = self.backend.update_multipart(id, payload).await?;
        info!(resource = self.resource(), id, "updated (multipart)");
        self.invalidate_records([id]);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), CoreError> {
        let _pending = self.begin();
        self.backend.delete(id).await?;
        info!(resource = self.resource(), id, "deleted");
        self.invalidate_records([id]);
        Ok(())
    }

    // ── Bulk writes ──────────────────────────────────────────────────

    /// Apply `data` to every id in one request. An empty id list is a
    /// no-op. A failure covers the whole batch.
    pub async fn bulk_update<P: Serialize + ?Sized>(
        &self,
        ids: &[String],
        data: &P,
    ) -> Result<(), CoreError> {
        if ids.is_empty() {
            debug!(resource = self.resource(), "bulk update with no ids, skipped");
            return Ok(());
        }
        let body = serde_json::to_value(data)?;
        let _pending = self.begin();
        if let Err(e) = self.backend.bulk_update(ids, &body).await {
            warn!(resource = self.resource(), count = ids.len(), error = %e, "bulk update failed");
            return Err(e);
        }
        info!(resource = self.resource(), count = ids.len(), "bulk updated");
        self.invalidate_records(ids.iter().map(String::as_str));
        Ok(())
    }

    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), CoreError> {
        if ids.is_empty() {
            debug!(resource = self.resource(), "bulk delete with no ids, skipped");
            return Ok(());
        }
        let _pending = self.begin();
        if let Err(e) = self.backend.bulk_delete(ids).await {
            warn!(resource = self.resource(), count = ids.len(), error = %e, "bulk delete failed");
            return Err(e);
        }
        info!(resource = self.resource(), count = ids.len(), "bulk deleted");
        self.invalidate_records(ids.iter().map(String::as_str));
        Ok(())
    }

    /// Bulk status change: `{"isActive": active}` for every id.
    pub async fn set_active(&self, ids: &[String], active: bool) -> Result<(), CoreError> {
        self.bulk_update(ids, &json!({ "isActive": active })).await
    }

    // ── Invalidation ─────────────────────────────────────────────────

    fn begin(&self) -> PendingGuard {
        self.pending.fetch_add(1, Ordering::AcqRel);
        PendingGuard(Arc::clone(&self.pending))
    }

    fn invalidate_collections(&self) {
        let resource = self.resource().to_owned();
        self.cache.invalidate(&KeyPrefix::Lists(resource.clone()));
        self.cache.invalidate(&KeyPrefix::Options(resource));
    }

    fn invalidate_records<'a>(&self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.cache
                .invalidate(&KeyPrefix::Detail(self.resource().to_owned(), id.to_owned()));
        }
        self.invalidate_collections();
    }
}
