//! Query-string construction from structured filter/sort/pagination intent.
//!
//! A [`QueryDescriptor`] is built fresh from UI state before every list
//! request and serialized once. Fields with empty or absent values are never
//! included, so the backend only ever sees filters the user actually set.

use url::form_urlencoded;

/// A scalar value accepted by the query string builder.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl QueryValue {
    fn render(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Str(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::UInt(u64::from(value))
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered collection of query fields, immutable once serialized.
///
/// Insertion order is preserved in the output. Empty strings are dropped at
/// insertion time; `None` values are dropped by [`QueryDescriptor::push_opt`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    fields: Vec<(String, QueryValue)>,
}

impl QueryDescriptor {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field. Empty string values are silently dropped.
    pub fn push(&mut self, key: &str, value: impl Into<QueryValue>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.fields.push((key.to_string(), value));
    }

    /// Append an optional field; `None` is dropped.
    pub fn push_opt(&mut self, key: &str, value: Option<impl Into<QueryValue>>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Whether any field qualified for inclusion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields that qualified for inclusion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Serialize to a URL query string.
    ///
    /// Returns the empty string when no fields qualify; otherwise `?` followed
    /// by `&`-joined percent-encoded `key=value` pairs in insertion order.
    /// This function is referentially pure: deterministic, no side effects,
    /// and it never fails.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        if self.fields.is_empty() {
            return String::new();
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.fields {
            serializer.append_pair(key, &value.render());
        }
        format!("?{}", serializer.finish())
    }
}
