//! Request states and terminal outcomes.

use std::fmt;

use super::LoadedImage;
use crate::domain::errors::DisplayError;

/// Lifecycle state of a display request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Built, URI not yet resolved.
    Built,
    /// URI resolution in progress.
    Resolving,
    /// Resolved and waiting for a worker.
    Queued,
    /// Fetch and decode in progress.
    Executing,
    /// Image delivered.
    Completed,
    /// Failed with an error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl RequestState {
    /// Returns true for the three sticky states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Built, Self::Resolving | Self::Cancelled)
            | (Self::Resolving, Self::Queued | Self::Executing | Self::Failed | Self::Cancelled)
            | (Self::Queued, Self::Executing | Self::Cancelled)
            | (Self::Executing, Self::Completed | Self::Failed | Self::Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Built => "built",
            Self::Resolving => "resolving",
            Self::Queued => "queued",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Why a request was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelCause {
    /// The caller cancelled it.
    Requested,
    /// Its target was bound to a newer request.
    Replaced,
    /// The image needs a download but the request level is `Local`.
    RequestLevelIsLocal,
    /// The image is not in memory and the request level is `Memory`.
    RequestLevelIsMemory,
    /// The dispatcher is shutting down.
    Shutdown,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Requested => "cancelled by caller",
            Self::Replaced => "target rebound to a newer request",
            Self::RequestLevelIsLocal => "download skipped at local request level",
            Self::RequestLevelIsMemory => "not in memory at memory request level",
            Self::Shutdown => "dispatcher shut down",
        };
        f.write_str(reason)
    }
}

/// Terminal outcome of a display request.
#[derive(Debug, Clone)]
pub enum DisplayOutcome {
    /// The image was loaded.
    Completed(LoadedImage),
    /// Loading failed.
    Failed(DisplayError),
    /// The request was cancelled.
    Cancelled(CancelCause),
}

impl DisplayOutcome {
    /// Returns the state this outcome moves a request into.
    #[must_use]
    pub const fn state(&self) -> RequestState {
        match self {
            Self::Completed(_) => RequestState::Completed,
            Self::Failed(_) => RequestState::Failed,
            Self::Cancelled(_) => RequestState::Cancelled,
        }
    }

    /// Returns true for `Completed`.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
