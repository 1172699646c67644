//! Query supersession and debounce.
//!
//! Each logical query (the feed, one post's comments, the events list)
//! owns a [`QueryTracker`]. Issuing a ticket supersedes every earlier one;
//! a response is applied only if its ticket is still the latest.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Default)]
pub struct QueryTracker {
    latest: Arc<AtomicU64>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The latest ticket, without superseding it.
    pub fn current(&self) -> Ticket {
        Ticket(self.latest.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Issue a ticket, wait out the quiet period, and return the ticket only
    /// if nothing superseded it meanwhile.
    pub async fn debounced(&self, quiet: Duration) -> Option<Ticket> {
        let ticket = self.issue();
        tokio::time::sleep(quiet).await;
        self.is_current(ticket).then_some(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_ticket_supersedes_earlier() {
        let tracker = QueryTracker::new();
        let first = tracker.issue();
        assert!(tracker.is_current(first));

        let second = tracker.issue();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
        assert!(second > first);
    }

    #[test]
    fn clones_share_the_counter() {
        let tracker = QueryTracker::new();
        let clone = tracker.clone();
        let t = tracker.issue();
        clone.issue();
        assert!(!tracker.is_current(t));
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_drops_superseded_calls() {
        let tracker = QueryTracker::new();
        let quiet = Duration::from_millis(300);

        let early = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.debounced(quiet).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let late = tracker.debounced(quiet).await;

        assert_eq!(early.await.unwrap(), None);
        assert!(late.is_some());
    }
}
