//! Per-key cache entry state.

use serde_json::Value;
use tokio::sync::watch;

use crate::endpoint::Tag;
use crate::transport::ApiRequest;

/// Cache entry lifecycle.
///
/// ```text
/// idle -> loading -> success | error
/// success | error -> loading        (refetch or tag invalidation)
/// ```
///
/// An entry leaves the map entirely when its subscriber count reaches zero;
/// its payload may persist briefly in the warm cache for reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Subscribed but never fetched.
    Idle,
    /// A request is in flight.
    Loading,
    /// Last fetch succeeded; payload is present.
    Success,
    /// Last fetch failed; error message is present.
    Error,
}

/// Read-only view of an entry, handed to consumers.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub status: EntryStatus,
    /// Raw response body; typed decoding happens at the call site.
    pub payload: Option<Value>,
    pub error: Option<String>,
    /// Monotonic per-entry version, bumped on every applied change.
    pub version: u64,
}

/// The single in-flight request for an entry.
///
/// `seq` is the issue-order sequence number; a completion is applied only if
/// it still matches, so a superseded response can never clobber fresher data.
pub(crate) struct Inflight {
    pub(crate) seq: u64,
    pub(crate) done: watch::Sender<bool>,
}

pub(crate) struct CacheEntry {
    pub(crate) status: EntryStatus,
    pub(crate) payload: Option<Value>,
    pub(crate) error: Option<String>,
    pub(crate) subscribers: usize,
    pub(crate) provides: &'static [Tag],
    /// Template used to re-issue the request on invalidation.
    pub(crate) request: ApiRequest,
    pub(crate) inflight: Option<Inflight>,
    /// Set when an invalidation arrives while a request is in flight; the
    /// entry refetches once the current request completes.
    pub(crate) refetch_pending: bool,
    pub(crate) version: u64,
    pub(crate) changed: watch::Sender<u64>,
}

impl CacheEntry {
    pub(crate) fn new(request: ApiRequest, provides: &'static [Tag]) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            status: EntryStatus::Idle,
            payload: None,
            error: None,
            subscribers: 0,
            provides,
            request,
            inflight: None,
            refetch_pending: false,
            version: 0,
            changed,
        }
    }

    pub(crate) fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            status: self.status,
            payload: self.payload.clone(),
            error: self.error.clone(),
            version: self.version,
        }
    }

    /// Bump the version and wake subscribers.
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        let version = self.version;
        self.changed.send_modify(|v| *v = version);
    }
}
