//! In-process target binding table.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::domain::entities::{RequestId, TargetId};
use crate::domain::ports::TargetBinding;

/// `TargetBinding` backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct InMemoryTargetBinding {
    bindings: Mutex<HashMap<TargetId, RequestId>>,
}

impl InMemoryTargetBinding {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bound targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }

    /// Returns true if no target is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.lock().is_empty()
    }
}

impl TargetBinding for InMemoryTargetBinding {
    fn bound_request(&self, target: TargetId) -> Option<RequestId> {
        self.bindings.lock().get(&target).copied()
    }

    fn rebind(&self, target: TargetId, request: RequestId) -> Option<RequestId> {
        self.bindings
            .lock()
            .insert(target, request)
            .filter(|previous| *previous != request)
    }

    fn release(&self, target: TargetId, request: RequestId) -> bool {
        let mut bindings = self.bindings.lock();
        if bindings.get(&target) == Some(&request) {
            bindings.remove(&target);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rebind_returns_previous() {
        let binding = InMemoryTargetBinding::new();
        let first = RequestId::generate();
        let second = RequestId::generate();

        assert_eq!(binding.rebind(TargetId(1), first), None);
        assert_eq!(binding.rebind(TargetId(1), second), Some(first));
        assert!(binding.is_current(TargetId(1), second));
        assert!(!binding.is_current(TargetId(1), first));
    }

    #[test]
    fn test_rebind_same_request_is_noop() {
        let binding = InMemoryTargetBinding::new();
        let request = RequestId::generate();
        binding.rebind(TargetId(1), request);
        assert_eq!(binding.rebind(TargetId(1), request), None);
    }

    #[test]
    fn test_release_only_current() {
        let binding = InMemoryTargetBinding::new();
        let stale = RequestId::generate();
        let current = RequestId::generate();
        binding.rebind(TargetId(7), stale);
        binding.rebind(TargetId(7), current);

        assert!(!binding.release(TargetId(7), stale));
        assert_eq!(binding.bound_request(TargetId(7)), Some(current));
        assert!(binding.release(TargetId(7), current));
        assert!(binding.is_empty());
    }

    #[test]
    fn test_targets_are_independent() {
        let binding = InMemoryTargetBinding::new();
        binding.rebind(TargetId(1), RequestId::generate());
        binding.rebind(TargetId(2), RequestId::generate());
        assert_eq!(binding.len(), 2);
    }

    #[test]
    fn test_concurrent_rebinds_leave_one_current() {
        let binding = Arc::new(InMemoryTargetBinding::new());
        let ids: Vec<RequestId> = (0..16).map(|_| RequestId::generate()).collect();

        let handles: Vec<_> = ids
            .iter()
            .copied()
            .map(|id| {
                let binding = Arc::clone(&binding);
                std::thread::spawn(move || binding.rebind(TargetId(3), id))
            })
            .collect();
        let replaced: Vec<RequestId> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(replaced.len(), ids.len() - 1);
        let current = binding.bound_request(TargetId(3)).unwrap();
        assert!(!replaced.contains(&current));
    }
}
