// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Bounded Daily History

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::DailySummary;

/// Chronological daily summaries, capped at `max_len` most recent days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct History {
    max_len: usize,
    entries: VecDeque<DailySummary>,
}

impl History {
    pub fn new(max_len: usize) -> Self {
        Self { max_len: max_len.max(1), entries: VecDeque::new() }
    }

    /// A new history with `summary` at the end; the oldest days are evicted
    /// once the bound is exceeded. `self` is left as it was.
    pub fn appended(&self, summary: DailySummary) -> History {
        let mut entries = self.entries.clone();
        entries.push_back(summary);
        while entries.len() > self.max_len {
            entries.pop_front();
        }
        History { max_len: self.max_len, entries }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &DailySummary> {
        self.entries.iter()
    }

    pub fn earliest(&self) -> Option<&DailySummary> {
        self.entries.front()
    }

    pub fn latest(&self) -> Option<&DailySummary> {
        self.entries.back()
    }

    /// Day with the most people infectious among the retained entries.
    pub fn peak_infected(&self) -> Option<&DailySummary> {
        self.entries.iter().max_by_key(|s| s.infected)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
