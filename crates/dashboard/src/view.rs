//! The four-way render state for data-backed views.

/// Exactly one of these holds at any time; a view renders whichever it is
/// and nothing else. `Empty` means the fetch succeeded and matched nothing,
/// which renders differently from an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState<T> {
    #[default]
    Loading,
    Error(String),
    Empty,
    Populated(T),
}

impl<T> ViewState<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The populated value, if any.
    #[must_use]
    pub const fn populated(&self) -> Option<&T> {
        match self {
            Self::Populated(value) => Some(value),
            _ => None,
        }
    }

    /// The error message, if the view is in the error state.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> ViewState<Vec<T>> {
    /// Successful fetch result: `Empty` when nothing matched, `Populated`
    /// otherwise.
    #[must_use]
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Populated(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_items_distinguishes_empty() {
        assert_eq!(ViewState::<Vec<u8>>::from_items(vec![]), ViewState::Empty);
        assert_eq!(
            ViewState::from_items(vec![1]),
            ViewState::Populated(vec![1])
        );
    }

    #[test]
    fn test_accessors_are_exclusive() {
        let state: ViewState<Vec<u8>> = ViewState::Error("boom".to_string());
        assert!(state.is_error());
        assert!(!state.is_loading());
        assert!(state.populated().is_none());
        assert_eq!(state.error(), Some("boom"));
    }
}
