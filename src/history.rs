// src/history.rs - Fixed-size per-frame analysis history
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub angle: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_angle: Option<f64>,
    pub stage: String,
    pub reps: u32,
    pub is_valid: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append an entry, dropping the oldest once full.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// True when at least `k` entries exist and the latest `k` all satisfy `pred`.
    pub fn holds_for(&self, k: usize, pred: impl Fn(&HistoryEntry) -> bool) -> bool {
        k > 0 && self.entries.len() >= k && self.entries.iter().rev().take(k).all(pred)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
