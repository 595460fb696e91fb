//! Request construction and delivery error types.

use thiserror::Error;

use crate::domain::entities::RequestState;

/// Request construction error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum RequestError {
    #[error("invalid display request: {reason}")]
    Invalid { reason: String },
}

impl RequestError {
    /// Creates invalid request error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Reasons a state change or outcome was not applied.
///
/// These never reach a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum DeliveryError {
    #[error("outcome dropped: target was rebound to a newer request")]
    StaleRequestSuppressed,

    #[error("request already reached {state}")]
    AlreadyTerminal { state: RequestState },

    #[error("illegal transition {from} -> {to}")]
    InvalidTransition { from: RequestState, to: RequestState },
}
