//! Normalized response cache with tag-based invalidation.
//!
//! One [`store::CacheStore`] is shared process-wide. Entries are keyed by
//! (endpoint, serialized arguments); every read and invalidation flows
//! through the store - no consumer mutates cached data directly.

pub mod entry;
pub mod store;

pub use entry::{CacheSnapshot, EntryStatus};
pub use store::{CacheStore, FetchPlan, RefetchJob, Subscription};
