//! Debounced, last-query-wins search coordination.
//!
//! Artist search fires on every keystroke, so queries are debounced and
//! gated by a generation counter: only the most recently begun query may
//! deliver results. Stale queries resolve to `None` instead of racing the
//! newer one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;

/// Quiet period before a query is executed.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Queries shorter than this (after trimming) are not executed.
pub const MIN_QUERY_LEN: usize = 2;

/// Generation handle for one begun query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Coordinates overlapping search queries within one search box.
#[derive(Debug, Default)]
pub struct SearchSession {
    generation: AtomicU64,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new query, superseding every earlier one.
    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no newer query has begun since this ticket was issued.
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Keep `value` only if the ticket is still the latest query.
    pub fn accept<T>(&self, ticket: SearchTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            None
        }
    }

    /// Debounce and run one query end to end.
    ///
    /// Returns `Ok(None)` when the trimmed query is too short, when a newer
    /// query superseded this one during the debounce window, or when the
    /// results arrive after a newer query has begun.
    pub async fn run<T, F, Fut>(&self, query: &str, search: F) -> Result<Option<T>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let text = query.trim();
        if text.chars().count() < MIN_QUERY_LEN {
            return Ok(None);
        }

        let ticket = self.begin();
        tokio::time::sleep(SEARCH_DEBOUNCE).await;
        if !self.is_current(ticket) {
            return Ok(None);
        }

        let results = search(text.to_string()).await?;
        Ok(self.accept(ticket, results))
    }
}
