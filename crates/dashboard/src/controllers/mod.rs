//! Per-page controllers.
//!
//! A controller owns one page's filter, sort, and pagination state and the
//! [`crate::ViewState`] it renders from. Loads are two-phase so no borrow is
//! held across an await: `begin_load` bumps the generation and returns an
//! owned future, and `apply` installs the outcome only if its generation is
//! still current. A stale outcome (the user changed a filter mid-flight) is
//! discarded, so the view can never show results for superseded criteria.

pub mod create_parcel;
pub mod parcel_list;
pub mod profile;
pub mod user_list;

/// Result of one load, stamped with the generation that started it.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    pub(crate) generation: u64,
    pub(crate) result: Result<T, String>,
}

impl<T> LoadOutcome<T> {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Sort direction for list controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Backend sort parameter: the field name, `-`-prefixed for descending.
pub(crate) fn sort_param(field: &str, order: SortOrder) -> String {
    match order {
        SortOrder::Asc => field.to_string(),
        SortOrder::Desc => format!("-{field}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_param_prefixes_descending() {
        assert_eq!(sort_param("createdAt", SortOrder::Desc), "-createdAt");
        assert_eq!(sort_param("createdAt", SortOrder::Asc), "createdAt");
    }
}
