// ── Query cache ──
//
// Keyed, structurally-compared cache for resource reads. One `Slot`
// per key holds the last settled value, a fetch lock that collapses
// concurrent identical reads into one request, and a generation counter
// so a fetch that races an invalidation settles as already stale.
//
// Every settle or invalidation bumps a `watch` revision so views can
// re-render without polling.
//
// Slots nobody is fetching through and whose value is older than the gc
// window (or that never settled) are evicted whenever a new key is
// inserted, so one-off search keys do not accumulate.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use futures_core::Stream;
use shopdesk_api::QueryParams;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::error::CoreError;

/// Default freshness window for cached reads.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

/// Default time an idle entry is kept before eviction.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(300);

// ── Keys ─────────────────────────────────────────────────────────────

/// What a cached value answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// `[resource, params]`
    List(QueryParams),
    /// `[resource, id]`
    Detail(String),
    /// `[resource, "options", parentId?]`
    Options(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub resource: String,
    pub scope: KeyScope,
}

impl QueryKey {
    pub fn list(resource: impl Into<String>, params: QueryParams) -> Self {
        Self {
            resource: resource.into(),
            scope: KeyScope::List(params),
        }
    }

    pub fn detail(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            scope: KeyScope::Detail(id.into()),
        }
    }

    pub fn options(resource: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            resource: resource.into(),
            scope: KeyScope::Options(parent_id.map(str::to_owned)),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            KeyScope::List(p) => write!(f, "[{}, {:?}]", self.resource, p.to_query_pairs()),
            KeyScope::Detail(id) => write!(f, "[{}, {id}]", self.resource),
            KeyScope::Options(Some(parent)) => write!(f, "[{}, options, {parent}]", self.resource),
            KeyScope::Options(None) => write!(f, "[{}, options]", self.resource),
        }
    }
}

/// A partition of the key space, used for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Every key of the resource.
    Resource(String),
    /// Every list key of the resource, whatever its params.
    Lists(String),
    /// One record's detail key.
    Detail(String, String),
    /// Every options key of the resource.
    Options(String),
}

impl KeyPrefix {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match (self, &key.scope) {
            (Self::Resource(r), _) => *r == key.resource,
            (Self::Lists(r), KeyScope::List(_)) => *r == key.resource,
            (Self::Detail(r, id), KeyScope::Detail(key_id)) => *r == key.resource && id == key_id,
            (Self::Options(r), KeyScope::Options(_)) => *r == key.resource,
            _ => false,
        }
    }
}

// ── Storage ──────────────────────────────────────────────────────────

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
    stale: AtomicBool,
}

#[derive(Default)]
struct Slot {
    entry: ArcSwapOption<Entry>,
    fetch_lock: Mutex<()>,
    /// Bumped on every invalidation of this key.
    generation: AtomicU64,
}

impl Slot {
    /// Value usable without a request. `settled_since` accepts any value
    /// settled after that instant regardless of age: the caller was
    /// waiting on exactly that fetch.
    fn fresh<V: Send + Sync + 'static>(
        &self,
        stale_time: Duration,
        settled_since: Option<Instant>,
    ) -> Option<Arc<V>> {
        let entry = self.entry.load_full()?;
        if entry.stale.load(Ordering::Acquire) {
            return None;
        }
        let usable = entry.fetched_at.elapsed() < stale_time
            || settled_since.is_some_and(|since| entry.fetched_at >= since);
        if !usable {
            return None;
        }
        Arc::clone(&entry.value).downcast::<V>().ok()
    }

    /// Idle and either never settled or settled longer than `gc_time` ago.
    /// `slot` is the map's own handle; any other handle is an in-flight
    /// fetch.
    fn collectable(slot: &Arc<Slot>, gc_time: Duration) -> bool {
        if Arc::strong_count(slot) > 1 {
            return false;
        }
        slot.entry
            .load_full()
            .is_none_or(|entry| entry.fetched_at.elapsed() >= gc_time)
    }
}

/// A cached value plus whether it is known to be out of date.
#[derive(Debug)]
pub struct Cached<V> {
    pub value: Arc<V>,
    pub stale: bool,
}

impl<V> Clone for Cached<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            stale: self.stale,
        }
    }
}

struct CacheInner {
    slots: DashMap<QueryKey, Arc<Slot>>,
    stale_time: Duration,
    gc_time: Duration,
    revision: watch::Sender<u64>,
}

/// Shared query cache. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.slots.len())
            .field("stale_time", &self.inner.stale_time)
            .field("gc_time", &self.inner.gc_time)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self::with_gc_time(stale_time, DEFAULT_GC_TIME)
    }

    /// `gc_time` is raised to `stale_time` if shorter, so a fresh entry
    /// is never evicted.
    pub fn with_gc_time(stale_time: Duration, gc_time: Duration) -> Self {
        let (revision, _) = watch::channel(0u64);
        Self {
            inner: Arc::new(CacheInner {
                slots: DashMap::new(),
                stale_time,
                gc_time: gc_time.max(stale_time),
                revision,
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    pub fn gc_time(&self) -> Duration {
        self.inner.gc_time
    }

    /// Return the cached value for `key` if fresh, otherwise run
    /// `fetcher` and cache its success. Concurrent calls for the same
    /// key share one fetch. Failures are returned, never cached.
    pub async fn fetch<V, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Arc<V>, CoreError>
    where
        V: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, CoreError>>,
    {
        let slot = self.slot(&key);
        let stale_time = self.inner.stale_time;
        if let Some(value) = slot.fresh::<V>(stale_time, None) {
            debug!(%key, "cache hit");
            return Ok(value);
        }

        let waiting_since = Instant::now();
        let _guard = slot.fetch_lock.lock().await;
        if let Some(value) = slot.fresh::<V>(stale_time, Some(waiting_since)) {
            debug!(%key, "joined in-flight fetch");
            return Ok(value);
        }

        let generation = slot.generation.load(Ordering::Acquire);
        debug!(%key, "cache miss, fetching");
        let value = Arc::new(fetcher().await?);

        let raced = slot.generation.load(Ordering::Acquire) != generation;
        let erased: Arc<dyn Any + Send + Sync> = value.clone();
        slot.entry.store(Some(Arc::new(Entry {
            value: erased,
            fetched_at: Instant::now(),
            stale: AtomicBool::new(raced),
        })));
        if raced {
            debug!(%key, "invalidated during fetch, stored as stale");
        }
        self.bump_revision();
        Ok(value)
    }

    /// Last settled value for `key`, fresh or not. Never fetches.
    pub fn peek<V: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Cached<V>> {
        let slot = self.inner.slots.get(key).map(|s| Arc::clone(s.value()))?;
        let entry = slot.entry.load_full()?;
        let stale = entry.stale.load(Ordering::Acquire)
            || entry.fetched_at.elapsed() >= self.inner.stale_time;
        let value = Arc::clone(&entry.value).downcast::<V>().ok()?;
        Some(Cached { value, stale })
    }

    /// Mark every key under `prefix` stale so the next read refetches.
    /// Cached values stay readable through [`peek`](Self::peek).
    /// Returns the number of keys affected.
    pub fn invalidate(&self, prefix: &KeyPrefix) -> usize {
        let mut count = 0;
        for slot in self.inner.slots.iter().filter(|s| prefix.matches(s.key())) {
            slot.generation.fetch_add(1, Ordering::AcqRel);
            if let Some(entry) = slot.entry.load_full() {
                entry.stale.store(true, Ordering::Release);
            }
            count += 1;
        }
        if count > 0 {
            debug!(?prefix, count, "invalidated");
            self.bump_revision();
        }
        count
    }

    /// Evict idle entries older than the gc window. Returns the number
    /// of keys removed.
    pub fn gc(&self) -> usize {
        let gc_time = self.inner.gc_time;
        let before = self.inner.slots.len();
        self.inner
            .slots
            .retain(|_, slot| !Slot::collectable(slot, gc_time));
        let evicted = before.saturating_sub(self.inner.slots.len());
        if evicted > 0 {
            debug!(evicted, "evicted idle cache entries");
        }
        evicted
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.slots.clear();
        self.bump_revision();
    }

    /// Number of keys with a slot (settled or in flight).
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    /// Current revision; bumped on every settle, invalidation and clear.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Revision changes as a `Stream`.
    pub fn changes(&self) -> CacheChanges {
        CacheChanges {
            inner: WatchStream::new(self.subscribe()),
        }
    }

    fn slot(&self, key: &QueryKey) -> Arc<Slot> {
        if let Some(slot) = self.inner.slots.get(key) {
            return Arc::clone(slot.value());
        }
        self.gc();
        Arc::clone(self.inner.slots.entry(key.clone()).or_default().value())
    }

    fn bump_revision(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.inner.revision.send_modify(|r| *r += 1);
    }
}

/// `Stream` of cache revisions backed by a `watch::Receiver`.
pub struct CacheChanges {
    inner: WatchStream<u64>,
}

impl Stream for CacheChanges {
    type Item = u64;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counted(calls: &AtomicUsize, value: u32) -> impl Future<Output = Result<u32, CoreError>> {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Ok(value) }
    }

    #[tokio::test]
    async fn fresh_value_is_served_from_cache() {
        let cache = QueryCache::default();
        let calls = AtomicUsize::new(0);
        let key = QueryKey::detail("brands", "1");

        let a = cache.fetch(key.clone(), || counted(&calls, 7)).await.unwrap();
        let b = cache.fetch(key, || counted(&calls, 8)).await.unwrap();

        assert_eq!((*a, *b), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_value_is_refetched() {
        let cache = QueryCache::new(Duration::from_secs(5));
        let calls = AtomicUsize::new(0);
        let key = QueryKey::detail("brands", "1");

        cache.fetch(key.clone(), || counted(&calls, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.peek::<u32>(&key).unwrap().stale);

        let v = cache.fetch(key, || counted(&calls, 2)).await.unwrap();
        assert_eq!(*v, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cache = QueryCache::default();
        let key = QueryKey::detail("brands", "1");

        let err = cache
            .fetch::<u32, _, _>(key.clone(), || async {
                Err(CoreError::Internal("boom".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Internal("boom".into()));
        assert!(cache.peek::<u32>(&key).is_none());
    }

    #[tokio::test]
    async fn invalidate_by_prefix() {
        let cache = QueryCache::default();
        let calls = AtomicUsize::new(0);
        let list_a = QueryKey::list("brands", QueryParams::default());
        let list_b = QueryKey::list("brands", QueryParams::default().with_page(2));
        let detail = QueryKey::detail("brands", "1");
        let other = QueryKey::list("models", QueryParams::default());

        for key in [&list_a, &list_b, &detail, &other] {
            cache.fetch(key.clone(), || counted(&calls, 0)).await.unwrap();
        }

        assert_eq!(cache.invalidate(&KeyPrefix::Lists("brands".into())), 2);
        assert!(cache.peek::<u32>(&list_a).unwrap().stale);
        assert!(cache.peek::<u32>(&list_b).unwrap().stale);
        assert!(!cache.peek::<u32>(&detail).unwrap().stale);
        assert!(!cache.peek::<u32>(&other).unwrap().stale);

        assert_eq!(cache.invalidate(&KeyPrefix::Resource("brands".into())), 3);
    }

    #[tokio::test]
    async fn concurrent_fetches_share_one_request() {
        let cache = QueryCache::new(Duration::ZERO);
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::list("brands", QueryParams::default());

        let slow = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, CoreError>(5u32)
        };

        let (a, b) = tokio::join!(
            cache.fetch(key.clone(), || slow(Arc::clone(&calls))),
            cache.fetch(key.clone(), || slow(Arc::clone(&calls))),
        );
        assert_eq!((*a.unwrap(), *b.unwrap()), (5, 5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn revision_moves_on_settle_and_invalidate() {
        let cache = QueryCache::default();
        let rx = cache.subscribe();
        let key = QueryKey::options("brands", None);

        cache.fetch(key, || async { Ok(1u8) }).await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        cache.invalidate(&KeyPrefix::Options("brands".into()));
        assert_eq!(cache.revision(), 2);
        assert_eq!(cache.invalidate(&KeyPrefix::Options("nothing".into())), 0);
        assert_eq!(cache.revision(), 2);
    }

    #[tokio::test]
    async fn changes_stream_yields_revisions() {
        use tokio_stream::StreamExt;

        let cache = QueryCache::default();
        let mut changes = cache.changes();
        assert_eq!(changes.next().await, Some(0));

        cache.clear();
        assert_eq!(changes.next().await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_entries_are_evicted_after_gc_time() {
        let cache = QueryCache::with_gc_time(Duration::from_secs(5), Duration::from_secs(60));
        let first = QueryKey::list("brands", QueryParams::default().with_search("a"));
        let recent = QueryKey::list("brands", QueryParams::default().with_search("ab"));

        cache.fetch(first.clone(), || async { Ok(1u32) }).await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.fetch(recent.clone(), || async { Ok(2u32) }).await.unwrap();
        assert_eq!(cache.len(), 2);

        tokio::time::advance(Duration::from_secs(15)).await;
        let next = QueryKey::list("brands", QueryParams::default().with_search("abc"));
        cache.fetch(next, || async { Ok(3u32) }).await.unwrap();

        assert!(cache.peek::<u32>(&first).is_none());
        assert_eq!(*cache.peek::<u32>(&recent).unwrap().value, 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gc_keeps_slots_with_a_fetch_in_flight() {
        let cache = QueryCache::with_gc_time(Duration::ZERO, Duration::ZERO);
        let slow = QueryKey::detail("brands", "1");

        let pending = cache.fetch(slow.clone(), || async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, CoreError>(1u32)
        });
        let other = async {
            tokio::task::yield_now().await;
            assert_eq!(cache.gc(), 0);
            assert_eq!(cache.len(), 1);
        };
        let (value, ()) = tokio::join!(pending, other);
        assert_eq!(*value.unwrap(), 1);
    }

    #[test]
    fn gc_time_is_never_shorter_than_stale_time() {
        let cache = QueryCache::with_gc_time(Duration::from_secs(30), Duration::from_secs(1));
        assert_eq!(cache.gc_time(), Duration::from_secs(30));
    }

    #[test]
    fn prefix_matching() {
        let detail = QueryKey::detail("brands", "1");
        assert!(KeyPrefix::Detail("brands".into(), "1".into()).matches(&detail));
        assert!(!KeyPrefix::Detail("brands".into(), "2".into()).matches(&detail));
        assert!(!KeyPrefix::Lists("brands".into()).matches(&detail));
        assert!(KeyPrefix::Resource("brands".into()).matches(&detail));
        assert!(!KeyPrefix::Resource("models".into()).matches(&detail));
    }
}
