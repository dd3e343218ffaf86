//! Per-run request budget.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Caps the number of fetches one run may issue. Clones share the count.
#[derive(Debug, Clone)]
pub struct RequestBudget {
    limit: Option<usize>,
    issued: Arc<AtomicUsize>,
}

impl RequestBudget {
    /// Budget of `limit` requests; 0 means unlimited.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: (limit > 0).then_some(limit),
            issued: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Take one slot. Returns false once the budget is spent.
    pub fn try_take(&self) -> bool {
        let limit = self.limit;
        self.issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match limit {
                Some(max) if n >= max => None,
                _ => Some(n + 1),
            })
            .is_ok()
    }

    /// Number of slots taken so far.
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|max| self.issued() >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_stops_at_limit() {
        let budget = RequestBudget::new(2);
        assert!(budget.try_take());
        assert!(budget.try_take());
        assert!(!budget.try_take());
        assert!(budget.is_exhausted());
        assert_eq!(budget.issued(), 2);
    }

    #[test]
    fn test_zero_is_unlimited() {
        let budget = RequestBudget::unlimited();
        for _ in 0..1000 {
            assert!(budget.try_take());
        }
        assert!(!budget.is_exhausted());
        assert_eq!(budget.limit(), None);
    }

    #[test]
    fn test_clones_share_count() {
        let budget = RequestBudget::new(1);
        let other = budget.clone();
        assert!(budget.try_take());
        assert!(!other.try_take());
    }
}
