//! The process-wide cache store.
//!
//! Guarantees, per cache key:
//! - at most one in-flight network request (concurrent identical reads
//!   coalesce onto the same completion channel)
//! - responses are applied in issue order; a superseded completion is
//!   discarded, never applied
//! - a successful mutation invalidates tags, and every subscribed entry
//!   providing one of those tags refetches exactly once

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::endpoint::{CacheKey, Tag};
use crate::transport::ApiRequest;

use super::entry::{CacheEntry, CacheSnapshot, EntryStatus, Inflight};

/// How long an evicted entry's payload is kept for reuse.
const WARM_TTL: Duration = Duration::from_secs(60);
const WARM_CAPACITY: u64 = 512;

/// What the caller must do after asking the store to fetch a key.
pub enum FetchPlan {
    /// A fresh payload is already available; no network call.
    Serve(CacheSnapshot),
    /// An identical request is in flight; await its completion channel.
    Join(watch::Receiver<bool>),
    /// The caller owns the network call for issue sequence `seq`.
    Fetch { seq: u64 },
}

/// A refetch the caller must execute after an invalidation.
#[derive(Debug)]
pub struct RefetchJob {
    pub key: CacheKey,
    pub request: ApiRequest,
    pub seq: u64,
}

struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Tag to subscriber-key mapping; covers live and warm-parked keys.
    tag_index: HashMap<Tag, HashSet<CacheKey>>,
}

struct StoreInner {
    state: Mutex<CacheState>,
    /// Payloads of recently evicted entries, kept briefly for reuse.
    warm: moka::sync::Cache<CacheKey, Value>,
    seq: AtomicU64,
}

/// Shared cache handle; all clones point at the same store.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<StoreInner>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    #[must_use]
    pub fn new() -> Self {
        let warm = moka::sync::Cache::builder()
            .max_capacity(WARM_CAPACITY)
            .time_to_live(WARM_TTL)
            .build();
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    tag_index: HashMap::new(),
                }),
                warm,
                seq: AtomicU64::new(0),
            }),
        }
    }

    fn next_seq(&self) -> u64 {
        self.inner.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Plan a fetch for `key`, creating the entry if needed.
    ///
    /// Exactly one concurrent caller per key receives [`FetchPlan::Fetch`];
    /// everyone else joins or is served from cache.
    pub fn begin_fetch(
        &self,
        key: &CacheKey,
        request: &ApiRequest,
        provides: &'static [Tag],
    ) -> FetchPlan {
        let mut state = self.lock();
        let state = &mut *state;

        if let Some(entry) = state.entries.get_mut(key) {
            if let Some(inflight) = &entry.inflight {
                debug!(%key, "joining in-flight request");
                return FetchPlan::Join(inflight.done.subscribe());
            }
            return match entry.status {
                EntryStatus::Success => {
                    debug!(%key, "cache hit");
                    FetchPlan::Serve(entry.snapshot())
                }
                EntryStatus::Idle | EntryStatus::Error | EntryStatus::Loading => {
                    let seq = self.next_seq();
                    Self::mark_loading(entry, seq);
                    FetchPlan::Fetch { seq }
                }
            };
        }

        // Unsubscribed reuse: serve straight from the warm cache without
        // resurrecting an entry.
        if let Some(payload) = self.inner.warm.get(key) {
            debug!(%key, "warm cache hit");
            return FetchPlan::Serve(CacheSnapshot {
                status: EntryStatus::Success,
                payload: Some(payload),
                error: None,
                version: 0,
            });
        }

        let mut entry = CacheEntry::new(request.clone(), provides);
        let seq = self.next_seq();
        Self::mark_loading(&mut entry, seq);
        index_tags(&mut state.tag_index, provides, key);
        state.entries.insert(key.clone(), entry);
        FetchPlan::Fetch { seq }
    }

    /// Apply a successful response for issue sequence `seq`.
    ///
    /// Returns a refetch job when an invalidation arrived while this request
    /// was in flight. A stale completion (superseded sequence) is discarded.
    pub fn apply_success(&self, key: &CacheKey, seq: u64, payload: Value) -> Option<RefetchJob> {
        let mut state = self.lock();
        let entry = state.entries.get_mut(key)?;

        if !Self::completes_inflight(entry, seq) {
            warn!(%key, seq, "discarding stale response");
            return None;
        }

        entry.status = EntryStatus::Success;
        entry.payload = Some(payload);
        entry.error = None;
        entry.touch();

        self.after_apply(&mut state, key)
    }

    /// Apply a failed fetch for issue sequence `seq`.
    pub fn apply_error(&self, key: &CacheKey, seq: u64, message: String) -> Option<RefetchJob> {
        let mut state = self.lock();
        let entry = state.entries.get_mut(key)?;

        if !Self::completes_inflight(entry, seq) {
            warn!(%key, seq, "discarding stale error");
            return None;
        }

        entry.status = EntryStatus::Error;
        entry.error = Some(message);
        entry.touch();

        self.after_apply(&mut state, key)
    }

    /// Invalidate tags after a confirmed-successful mutation.
    ///
    /// Returns the refetch jobs the caller must execute - one per subscribed
    /// entry that has data and provides one of `tags`. Unsubscribed stale
    /// entries (live or warm) are dropped instead of refetched.
    pub fn invalidate(&self, tags: &[Tag]) -> Vec<RefetchJob> {
        let mut state = self.lock();
        let state = &mut *state;
        let keys = keys_for_tags(tags, &state.tag_index);
        let mut jobs = Vec::new();

        for key in keys {
            let mut drop_entry = true;
            if let Some(entry) = state.entries.get_mut(&key) {
                drop_entry = false;
                if entry.inflight.is_some() {
                    // The in-flight response predates the write; refetch once
                    // it lands rather than racing a second request on the key.
                    entry.refetch_pending = true;
                } else if entry.subscribers > 0 && entry.status != EntryStatus::Idle {
                    let seq = self.next_seq();
                    Self::mark_loading(entry, seq);
                    jobs.push(RefetchJob {
                        request: entry.request.clone(),
                        key: key.clone(),
                        seq,
                    });
                } else if entry.subscribers == 0 {
                    drop_entry = true;
                }
                // Subscribed but idle entries have nothing to refetch.
            }

            if drop_entry {
                // Live-unsubscribed or warm-parked only; stale now.
                state.entries.remove(&key);
                self.inner.warm.invalidate(&key);
                deindex_key(&mut state.tag_index, &key);
            }
        }

        debug!(?tags, refetches = jobs.len(), "invalidated tags");
        jobs
    }

    /// Subscribe to a key, creating an idle entry if none exists.
    ///
    /// A warm-parked payload is promoted back into the live entry, so a
    /// resubscribe within the reuse window needs no network call.
    pub fn subscribe(
        &self,
        key: &CacheKey,
        request: &ApiRequest,
        provides: &'static [Tag],
    ) -> Subscription {
        let mut state = self.lock();
        let state = &mut *state;

        let entry = state.entries.entry(key.clone()).or_insert_with(|| {
            let mut entry = CacheEntry::new(request.clone(), provides);
            if let Some(payload) = self.inner.warm.remove(key) {
                entry.status = EntryStatus::Success;
                entry.payload = Some(payload);
            }
            entry
        });
        entry.subscribers += 1;
        let changed = entry.changed.subscribe();
        index_tags(&mut state.tag_index, provides, key);

        Subscription {
            store: self.clone(),
            key: key.clone(),
            changed,
        }
    }

    /// Read the current snapshot for a key, live entries only.
    #[must_use]
    pub fn snapshot(&self, key: &CacheKey) -> Option<CacheSnapshot> {
        self.lock().entries.get(key).map(CacheEntry::snapshot)
    }

    /// Read the latest payload for a key, falling back to the warm cache.
    #[must_use]
    pub fn read_payload(&self, key: &CacheKey) -> Option<Value> {
        if let Some(snapshot) = self.snapshot(key)
            && snapshot.payload.is_some()
        {
            return snapshot.payload;
        }
        self.inner.warm.get(key)
    }

    /// Drop all cached state. Used on logout so no data outlives the session.
    pub fn clear(&self) {
        let mut state = self.lock();
        for entry in state.entries.values_mut() {
            if let Some(inflight) = entry.inflight.take() {
                let _ = inflight.done.send(true);
            }
            entry.status = EntryStatus::Idle;
            entry.payload = None;
            entry.error = None;
            entry.touch();
        }
        state.entries.retain(|_, entry| entry.subscribers > 0);
        // Reindex the survivors; warm-parked keys are gone for good.
        state.tag_index.clear();
        let state = &mut *state;
        for (key, entry) in &state.entries {
            index_tags(&mut state.tag_index, entry.provides, key);
        }
        self.inner.warm.invalidate_all();
    }

    /// Number of live entries (diagnostics and tests).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        #[allow(clippy::expect_used)]
        self.inner.state.lock().expect("cache lock poisoned")
    }

    fn mark_loading(entry: &mut CacheEntry, seq: u64) {
        let (done, _) = watch::channel(false);
        entry.inflight = Some(Inflight { seq, done });
        entry.status = EntryStatus::Loading;
        entry.touch();
    }

    /// True when `seq` matches the entry's current in-flight request; takes
    /// the in-flight slot and signals joiners.
    fn completes_inflight(entry: &mut CacheEntry, seq: u64) -> bool {
        match &entry.inflight {
            Some(inflight) if inflight.seq == seq => {
                let inflight = entry.inflight.take();
                if let Some(inflight) = inflight {
                    let _ = inflight.done.send(true);
                }
                true
            }
            _ => false,
        }
    }

    /// Post-application housekeeping: pending refetch or zero-subscriber
    /// eviction into the warm cache.
    fn after_apply(&self, state: &mut CacheState, key: &CacheKey) -> Option<RefetchJob> {
        let entry = state.entries.get_mut(key)?;

        if entry.refetch_pending {
            entry.refetch_pending = false;
            let seq = self.next_seq();
            Self::mark_loading(entry, seq);
            return Some(RefetchJob {
                request: entry.request.clone(),
                key: key.clone(),
                seq,
            });
        }

        if entry.subscribers == 0 {
            if entry.status == EntryStatus::Success
                && let Some(payload) = entry.payload.clone()
            {
                self.inner.warm.insert(key.clone(), payload);
            }
            state.entries.remove(key);
        }
        None
    }

    fn unsubscribe(&self, key: &CacheKey) {
        let mut state = self.lock();
        let state = &mut *state;
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers > 0 || entry.inflight.is_some() {
            return;
        }
        let provides = entry.provides;
        if entry.status == EntryStatus::Success
            && let Some(payload) = entry.payload.clone()
        {
            self.inner.warm.insert(key.clone(), payload);
        }
        state.entries.remove(key);

        // The tag index keeps this key while its warm copy lives, so
        // invalidation can still purge it. Sibling keys whose entry and warm
        // copy are both gone (the TTL lapsed) are swept here; without the
        // sweep the index would grow without bound across a long
        // mutation-free session with many distinct filters.
        let CacheState { entries, tag_index } = state;
        for tag in provides {
            if let Some(tagged) = tag_index.get_mut(tag) {
                tagged.retain(|k| entries.contains_key(k) || self.inner.warm.contains_key(k));
            }
        }
    }
}

/// Pure invalidation step: which cache keys are affected by these tags.
pub(crate) fn keys_for_tags(
    tags: &[Tag],
    index: &HashMap<Tag, HashSet<CacheKey>>,
) -> Vec<CacheKey> {
    let mut keys: Vec<CacheKey> = Vec::new();
    let mut seen: HashSet<&CacheKey> = HashSet::new();
    for tag in tags {
        if let Some(tagged) = index.get(tag) {
            for key in tagged {
                if seen.insert(key) {
                    keys.push(key.clone());
                }
            }
        }
    }
    keys
}

fn index_tags(index: &mut HashMap<Tag, HashSet<CacheKey>>, tags: &[Tag], key: &CacheKey) {
    for tag in tags {
        index.entry(*tag).or_default().insert(key.clone());
    }
}

fn deindex_key(index: &mut HashMap<Tag, HashSet<CacheKey>>, key: &CacheKey) {
    for tagged in index.values_mut() {
        tagged.remove(key);
    }
}

/// RAII subscription handle; dropping it decrements the subscriber count and
/// may evict the entry.
pub struct Subscription {
    store: CacheStore,
    key: CacheKey,
    changed: watch::Receiver<u64>,
}

impl Subscription {
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Snapshot of the subscribed entry.
    #[must_use]
    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        self.store.snapshot(&self.key)
    }

    /// Wait until the entry changes (new data, error, or loading flip).
    ///
    /// Returns `false` if the entry is gone and no further changes will come.
    pub async fn changed(&mut self) -> bool {
        self.changed.changed().await.is_ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.unsubscribe(&self.key);
    }
}
