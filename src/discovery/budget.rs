use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Run-wide cap on outbound places API calls.
///
/// Clones share one counter. `try_acquire` checks and increments in a single
/// atomic step, so concurrent callers can never overspend the limit.
#[derive(Debug, Clone)]
pub struct CallBudget {
    used: Arc<AtomicUsize>,
    limit: Option<usize>,
}

impl CallBudget {
    /// A budget of at most `limit` calls
    pub fn new(limit: usize) -> Self {
        Self::with_limit(Some(limit))
    }

    pub fn unlimited() -> Self {
        Self::with_limit(None)
    }

    /// `None` means unlimited
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            used: Arc::new(AtomicUsize::new(0)),
            limit,
        }
    }

    /// Reserve one call. Returns `false` once the budget is spent.
    pub fn try_acquire(&self) -> bool {
        match self.limit {
            None => {
                self.used.fetch_add(1, Ordering::SeqCst);
                true
            }
            Some(limit) => self
                .used
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                    (used < limit).then_some(used + 1)
                })
                .is_ok(),
        }
    }

    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn remaining(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.used()))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }
}

impl Default for CallBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}
