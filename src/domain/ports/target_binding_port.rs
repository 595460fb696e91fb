//! Port definition for the target-to-request relation.

use crate::domain::entities::{RequestId, TargetId};

/// Relation from a UI target to the request currently bound to it.
///
/// Implementations must make `rebind` an atomic swap so two requests
/// issued concurrently against one target cannot both believe they are
/// current.
pub trait TargetBinding: Send + Sync {
    /// Returns the request currently bound to `target`.
    fn bound_request(&self, target: TargetId) -> Option<RequestId>;

    /// Binds `request` to `target`, returning the request it replaced.
    fn rebind(&self, target: TargetId, request: RequestId) -> Option<RequestId>;

    /// Unbinds `request` if it is still the one bound to `target`.
    fn release(&self, target: TargetId, request: RequestId) -> bool;

    /// Returns true if `request` is the one bound to `target`.
    fn is_current(&self, target: TargetId, request: RequestId) -> bool {
        self.bound_request(target) == Some(request)
    }
}
