//! Per-request lifecycle tracking and outcome delivery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};

use crate::domain::entities::{CancelCause, DisplayOutcome, DisplayRequest, RequestId, RequestState};
use crate::domain::errors::DeliveryError;

/// Progress reported on a [`DisplayTicket`] before the outcome arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Not executing yet.
    Pending,
    /// The pipeline started executing.
    Started,
    /// A terminal outcome was delivered.
    Finished,
}

/// Caller side of a submitted request.
#[derive(Debug)]
pub struct DisplayTicket {
    id: RequestId,
    progress: watch::Receiver<Progress>,
    outcome: oneshot::Receiver<DisplayOutcome>,
}

impl DisplayTicket {
    /// Returns the id of the request this ticket tracks.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the latest progress value.
    #[must_use]
    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    /// Waits until the request leaves `Pending`. Returns the new progress.
    pub async fn wait_started(&mut self) -> Progress {
        match self
            .progress
            .wait_for(|progress| *progress != Progress::Pending)
            .await
        {
            Ok(progress) => *progress,
            Err(_) => Progress::Finished,
        }
    }

    /// Waits for the terminal outcome.
    ///
    /// A request dropped without an outcome reports `Cancelled(Shutdown)`.
    pub async fn outcome(self) -> DisplayOutcome {
        self.outcome
            .await
            .unwrap_or(DisplayOutcome::Cancelled(CancelCause::Shutdown))
    }
}

/// Tracks one request through its state machine.
///
/// Every state change goes through [`RequestHandle::transition`] or
/// [`RequestHandle::finish`]; the first terminal outcome wins and is
/// delivered exactly once to the listener and the ticket.
pub struct RequestHandle {
    request: Arc<DisplayRequest>,
    state: Mutex<RequestState>,
    cancel_cause: Mutex<Option<CancelCause>>,
    replaced: AtomicBool,
    outcome_tx: Mutex<Option<oneshot::Sender<DisplayOutcome>>>,
    progress_tx: watch::Sender<Progress>,
    delivery: Mutex<()>,
}

impl std::fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle")
            .field("id", &self.request.id())
            .field("state", &*self.state.lock())
            .field("cancel_cause", &*self.cancel_cause.lock())
            .finish_non_exhaustive()
    }
}

impl RequestHandle {
    /// Wraps a freshly built request. It starts in `Built`.
    #[must_use]
    pub fn new(request: Arc<DisplayRequest>) -> (Arc<Self>, DisplayTicket) {
        let (outcome_tx, outcome) = oneshot::channel();
        let (progress_tx, progress) = watch::channel(Progress::Pending);
        let ticket = DisplayTicket {
            id: request.id(),
            progress,
            outcome,
        };
        let handle = Arc::new(Self {
            request,
            state: Mutex::new(RequestState::Built),
            cancel_cause: Mutex::new(None),
            replaced: AtomicBool::new(false),
            outcome_tx: Mutex::new(Some(outcome_tx)),
            progress_tx,
            delivery: Mutex::new(()),
        });
        (handle, ticket)
    }

    /// Returns the tracked request.
    #[must_use]
    pub fn request(&self) -> &Arc<DisplayRequest> {
        &self.request
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        *self.state.lock()
    }

    /// Returns true if the target was rebound away from this request.
    #[must_use]
    pub fn is_replaced(&self) -> bool {
        self.replaced.load(Ordering::Acquire)
    }

    /// Moves to a non-terminal state.
    ///
    /// Entering `Executing` fires `on_started`.
    ///
    /// # Errors
    /// Returns [`DeliveryError`] if the request is already terminal or the
    /// transition is not allowed.
    pub fn transition(&self, next: RequestState) -> Result<(), DeliveryError> {
        debug_assert!(!next.is_terminal(), "terminal states go through finish");
        self.swap_state(next)?;

        if next == RequestState::Executing {
            let _delivery = self.delivery.lock();
            if self.state() == RequestState::Executing {
                self.progress_tx.send_replace(Progress::Started);
                if let Some(listener) = self.request.listener() {
                    listener.on_started(&self.request);
                }
            }
        }
        Ok(())
    }

    /// Returns the pending cancel cause, if cancellation was requested.
    #[must_use]
    pub fn checkpoint(&self) -> Option<CancelCause> {
        *self.cancel_cause.lock()
    }

    /// Requests cancellation.
    ///
    /// A request that is not executing yet, or whose target was rebound,
    /// finishes immediately. An executing request finishes at its next
    /// checkpoint. Returns true if this call delivered the outcome.
    pub fn cancel(&self, cause: CancelCause) -> bool {
        if cause == CancelCause::Replaced {
            if !self.supersede() {
                return false;
            }
            self.deliver(DisplayOutcome::Cancelled(cause));
            return true;
        }
        self.request_cancel(cause);

        let state = self.state();
        if state.is_terminal() || state == RequestState::Executing {
            return false;
        }
        self.finish(DisplayOutcome::Cancelled(cause)).is_ok()
    }

    /// Marks the request stale and moves it to `Cancelled` in one step.
    ///
    /// Returns true if the request was not terminal yet. The caller then
    /// owns delivery of `Cancelled(Replaced)` through [`Self::deliver`]; any
    /// later [`Self::settle`] reports [`DeliveryError::StaleRequestSuppressed`].
    pub fn supersede(&self) -> bool {
        self.request_cancel(CancelCause::Replaced);
        self.replaced.store(true, Ordering::Release);
        self.settle(RequestState::Cancelled).is_ok()
    }

    /// Delivers the terminal outcome.
    ///
    /// # Errors
    /// Returns [`DeliveryError::StaleRequestSuppressed`] if the target was
    /// rebound away from this request, or another [`DeliveryError`] if the
    /// request is terminal or cannot move to the outcome's state.
    pub fn finish(&self, outcome: DisplayOutcome) -> Result<(), DeliveryError> {
        self.settle(outcome.state())?;
        self.deliver(outcome);
        Ok(())
    }

    /// Commits the terminal state without delivering anything.
    ///
    /// Exactly one caller wins; it must follow up with [`Self::deliver`].
    ///
    /// # Errors
    /// Same as [`Self::finish`].
    pub fn settle(&self, next: RequestState) -> Result<(), DeliveryError> {
        debug_assert!(next.is_terminal(), "settle only commits terminal states");
        self.swap_state(next).map_err(|err| match err {
            DeliveryError::AlreadyTerminal { .. } if self.is_replaced() => {
                DeliveryError::StaleRequestSuppressed
            }
            other => other,
        })
    }

    /// Hands a settled outcome to the listener and the ticket.
    pub fn deliver(&self, outcome: DisplayOutcome) {
        let _delivery = self.delivery.lock();
        if let Some(listener) = self.request.listener() {
            match &outcome {
                DisplayOutcome::Completed(image) => listener.on_completed(&self.request, image),
                DisplayOutcome::Failed(error) => listener.on_failed(&self.request, error),
                DisplayOutcome::Cancelled(cause) => listener.on_cancelled(&self.request, *cause),
            }
        }
        self.progress_tx.send_replace(Progress::Finished);
        if let Some(tx) = self.outcome_tx.lock().take() {
            let _ = tx.send(outcome);
        }
    }

    fn request_cancel(&self, cause: CancelCause) {
        let mut pending = self.cancel_cause.lock();
        if pending.is_none() {
            *pending = Some(cause);
        }
    }

    fn swap_state(&self, next: RequestState) -> Result<(), DeliveryError> {
        let mut state = self.state.lock();
        if state.is_terminal() {
            return Err(DeliveryError::AlreadyTerminal { state: *state });
        }
        if !state.can_transition_to(next) {
            return Err(DeliveryError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DisplayRequestConfig, TargetId};
    use crate::domain::errors::{DisplayError, UriError};
    use crate::domain::ports::mocks::MockDisplayListener;
    use mockall::Sequence;

    fn handle_with(listener: Option<MockDisplayListener>) -> (Arc<RequestHandle>, DisplayTicket) {
        let request = DisplayRequest::new(DisplayRequestConfig {
            image_uri: Some("asset://a.png".to_string()),
            target: Some(TargetId(1)),
            listener: listener.map(|l| Arc::new(l) as Arc<dyn crate::domain::ports::DisplayListener>),
            ..Default::default()
        })
        .unwrap();
        RequestHandle::new(Arc::new(request))
    }

    #[tokio::test]
    async fn test_failed_outcome_is_delivered_once() {
        let mut listener = MockDisplayListener::new();
        listener.expect_on_failed().times(1).return_const(());
        listener.expect_on_started().never();
        let (handle, ticket) = handle_with(Some(listener));

        handle.transition(RequestState::Resolving).unwrap();
        let error = DisplayError::from(UriError::unresolved("nope://x"));
        handle.finish(DisplayOutcome::Failed(error.clone())).unwrap();

        assert!(matches!(
            handle.finish(DisplayOutcome::Failed(error)),
            Err(DeliveryError::AlreadyTerminal {
                state: RequestState::Failed
            })
        ));
        assert!(matches!(ticket.outcome().await, DisplayOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_started_precedes_terminal() {
        let mut seq = Sequence::new();
        let mut listener = MockDisplayListener::new();
        listener
            .expect_on_started()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        listener
            .expect_on_cancelled()
            .withf(|_, cause| *cause == CancelCause::Requested)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        let (handle, mut ticket) = handle_with(Some(listener));

        handle.transition(RequestState::Resolving).unwrap();
        handle.transition(RequestState::Executing).unwrap();
        assert_eq!(ticket.wait_started().await, Progress::Started);

        assert!(!handle.cancel(CancelCause::Requested));
        assert_eq!(handle.checkpoint(), Some(CancelCause::Requested));
        handle
            .finish(DisplayOutcome::Cancelled(CancelCause::Requested))
            .unwrap();
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::Requested)
        ));
    }

    #[tokio::test]
    async fn test_cancel_before_executing_finishes_immediately() {
        let mut listener = MockDisplayListener::new();
        listener.expect_on_started().never();
        listener.expect_on_cancelled().times(1).return_const(());
        let (handle, ticket) = handle_with(Some(listener));

        handle.transition(RequestState::Resolving).unwrap();
        assert!(handle.cancel(CancelCause::Requested));
        assert_eq!(handle.state(), RequestState::Cancelled);
        assert!(handle.transition(RequestState::Queued).is_err());
        assert!(matches!(ticket.outcome().await, DisplayOutcome::Cancelled(_)));
    }

    #[test]
    fn test_replaced_request_suppresses_late_outcome() {
        let mut listener = MockDisplayListener::new();
        listener.expect_on_started().times(1).return_const(());
        listener
            .expect_on_cancelled()
            .withf(|_, cause| *cause == CancelCause::Replaced)
            .times(1)
            .return_const(());
        listener.expect_on_completed().never();
        listener.expect_on_failed().never();
        let (handle, _ticket) = handle_with(Some(listener));

        handle.transition(RequestState::Resolving).unwrap();
        handle.transition(RequestState::Executing).unwrap();
        assert!(handle.cancel(CancelCause::Replaced));

        let late = DisplayOutcome::Failed(DisplayError::from(UriError::unresolved("x")));
        assert_eq!(
            handle.finish(late),
            Err(DeliveryError::StaleRequestSuppressed)
        );
    }

    #[test]
    fn test_supersede_loses_to_settled_outcome() {
        let mut listener = MockDisplayListener::new();
        listener.expect_on_started().times(1).return_const(());
        listener.expect_on_cancelled().never();
        let (handle, _ticket) = handle_with(Some(listener));

        handle.transition(RequestState::Resolving).unwrap();
        handle.transition(RequestState::Executing).unwrap();
        handle.settle(RequestState::Completed).unwrap();

        assert!(!handle.supersede());
        assert!(handle.is_replaced());
        assert_eq!(handle.state(), RequestState::Completed);
    }

    #[test]
    fn test_superseded_request_never_settles_again() {
        let mut listener = MockDisplayListener::new();
        listener.expect_on_started().never();
        listener.expect_on_completed().never();
        listener.expect_on_cancelled().never();
        let (handle, _ticket) = handle_with(Some(listener));

        handle.transition(RequestState::Resolving).unwrap();
        assert!(handle.supersede());
        assert_eq!(handle.checkpoint(), Some(CancelCause::Replaced));
        assert_eq!(
            handle.settle(RequestState::Completed),
            Err(DeliveryError::StaleRequestSuppressed)
        );
        assert!(handle.transition(RequestState::Executing).is_err());
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let (handle, _ticket) = handle_with(None);
        assert_eq!(
            handle.transition(RequestState::Executing),
            Err(DeliveryError::InvalidTransition {
                from: RequestState::Built,
                to: RequestState::Executing,
            })
        );
        assert_eq!(handle.state(), RequestState::Built);
    }

    #[tokio::test]
    async fn test_dropped_handle_reports_shutdown() {
        let (handle, ticket) = handle_with(None);
        drop(handle);
        assert!(matches!(
            ticket.outcome().await,
            DisplayOutcome::Cancelled(CancelCause::Shutdown)
        ));
    }
}
