//! Request stamping for stale-response detection.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic stamp handed out when a request starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Orders concurrent requests of one kind.
///
/// A response is stale when a request started later has already completed.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    completed: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Records completion of `ticket`.
    ///
    /// Returns `false` when a newer request completed first; the caller
    /// must drop this response.
    pub fn complete(&self, ticket: RequestTicket) -> bool {
        let previous = self.completed.fetch_max(ticket.0, Ordering::SeqCst);
        ticket.0 > previous
    }
}

#[cfg(test)]
mod tests {
    use super::RequestSequencer;

    #[test]
    fn in_order_completions_are_accepted() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin();
        assert!(sequencer.complete(first));
        let second = sequencer.begin();
        assert!(sequencer.complete(second));
    }

    #[test]
    fn older_response_after_newer_completion_is_stale() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin();
        let second = sequencer.begin();

        assert!(sequencer.complete(second));
        assert!(!sequencer.complete(first));
    }

    #[test]
    fn older_response_before_newer_completion_is_kept() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.begin();
        let second = sequencer.begin();

        assert!(sequencer.complete(first));
        assert!(sequencer.complete(second));
    }
}
