use serde::Serialize;

use super::view::Panel;

/// Lifecycle of one search action: `Idle -> Loading -> (Success | Empty |
/// Error)`. The terminal state stays until the next submit; a search dropped
/// while loading falls back to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    #[default]
    Idle,
    Loading,
    Success(Panel),
    Empty(Panel),
    Error,
}

impl SearchState {
    pub fn loading_visible(self) -> bool {
        matches!(self, SearchState::Loading)
    }

    pub fn submit_enabled(self) -> bool {
        !self.loading_visible()
    }
}

/// What a single `submit_search` call ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// No identifying field was filled in; nothing was sent.
    Invalid { message: String },
    /// Another search from this controller is still in flight.
    Busy,
    Success { panel: Panel, count: usize },
    Empty { panel: Panel },
    Failed { message: String },
}

impl SearchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }

    /// Terminal state reached by an outcome that actually issued a request.
    pub(crate) fn terminal_state(&self) -> Option<SearchState> {
        match self {
            SearchOutcome::Success { panel, .. } => Some(SearchState::Success(*panel)),
            SearchOutcome::Empty { panel } => Some(SearchState::Empty(*panel)),
            SearchOutcome::Failed { .. } => Some(SearchState::Error),
            SearchOutcome::Invalid { .. } | SearchOutcome::Busy => None,
        }
    }
}
