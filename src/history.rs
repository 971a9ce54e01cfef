// 🕒 History Log - the last few conversions of one session
//
// Bounded FIFO: newest last, oldest evicted once the capacity is reached.
// Purely in-memory; a session's log disappears with the session.

use serde::Serialize;
use std::collections::VecDeque;

/// Number of conversions kept per session
pub const HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryLog {
    entries: VecDeque<String>,
}

impl HistoryLog {
    pub fn new() -> Self {
        HistoryLog {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append an entry, discarding the oldest ones beyond capacity
    pub fn record(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        while self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    /// Entries oldest to newest
    pub fn render(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &String> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        HISTORY_CAPACITY
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}
