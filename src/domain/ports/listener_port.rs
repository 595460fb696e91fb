//! Port definition for display outcome listeners.

use crate::domain::entities::{CancelCause, DisplayRequest, LoadedImage};
use crate::domain::errors::DisplayError;

/// Receives the progress and terminal callbacks of one request.
///
/// `on_started` fires at most once and, if it fires, before the single
/// terminal callback. Exactly one of `on_completed`, `on_failed` and
/// `on_cancelled` fires per request.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayListener: Send + Sync {
    /// The request entered execution.
    fn on_started(&self, _request: &DisplayRequest) {}

    /// The image was loaded.
    fn on_completed(&self, _request: &DisplayRequest, _image: &LoadedImage) {}

    /// Loading failed.
    fn on_failed(&self, _request: &DisplayRequest, _error: &DisplayError) {}

    /// The request was cancelled.
    fn on_cancelled(&self, _request: &DisplayRequest, _cause: CancelCause) {}
}
