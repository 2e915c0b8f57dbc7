//! Static endpoint descriptors and the cache-tag contract.
//!
//! Each endpoint is a zero-sized type declared once at module load and never
//! mutated at runtime. Read endpoints implement [`QueryEndpoint`] and declare
//! the tags they provide; write endpoints implement [`MutationEndpoint`] and
//! declare the tags they invalidate on confirmed success.

use serde::de::DeserializeOwned;

/// Symbolic label grouping cache entries invalidated together after a
/// related write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Parcel lists and parcel detail queries.
    Parcels,
    /// User-management lists.
    Users,
    /// The authenticated user's own profile.
    CurrentUser,
}

/// HTTP verb for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// Reads are idempotent and safe to retry; writes are not.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Get)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read-only endpoint.
///
/// Subscribers to any tag in `PROVIDES` re-run the query when that tag is
/// invalidated by a mutation.
pub trait QueryEndpoint {
    /// Request arguments (filters, ids).
    type Args;
    /// Shape of the envelope's `data` field.
    type Data: DeserializeOwned;

    /// Stable endpoint name; half of the cache key.
    const NAME: &'static str;
    /// Tags this query provides.
    const PROVIDES: &'static [Tag];

    /// URL path (with query string) for the given arguments.
    fn path(args: &Self::Args) -> String;
}

/// A write endpoint.
///
/// On confirmed success every cached read providing a tag in `INVALIDATES`
/// is marked stale and, if subscribed, refetched. A failed write leaves the
/// cache untouched and is never retried automatically.
pub trait MutationEndpoint {
    /// Request arguments.
    type Args;
    /// Shape of the envelope's `data` field.
    type Data: DeserializeOwned;

    /// Stable endpoint name, used for tracing.
    const NAME: &'static str;
    /// HTTP verb; never `Verb::Get`.
    const VERB: Verb;
    /// Tags invalidated after a successful response.
    const INVALIDATES: &'static [Tag];

    /// URL path for the given arguments.
    fn path(args: &Self::Args) -> String;

    /// JSON request body, if any.
    fn body(args: &Self::Args) -> Option<serde_json::Value>;
}

/// Identity of one cached result: endpoint name plus serialized arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: &'static str,
    args: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(endpoint: &'static str, args: impl Into<String>) -> Self {
        Self {
            endpoint,
            args: args.into(),
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        self.endpoint
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}
