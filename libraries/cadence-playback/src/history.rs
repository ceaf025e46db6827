//! Recently played tracking
//!
//! Maintains a bounded list of items that started playing

use crate::types::PlayableItem;
use std::collections::VecDeque;

/// Recently played list with bounded size
///
/// Implements a ring buffer that automatically discards oldest entries.
/// Restarting the same item (repeat one, "previous" restart) does not add
/// a duplicate entry.
#[derive(Debug, Clone)]
pub struct History {
    /// History buffer (most recent = back)
    items: VecDeque<PlayableItem>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Record an item that started playing
    ///
    /// If history is full, oldest item is discarded
    pub fn push(&mut self, item: PlayableItem) {
        if self.max_size == 0 {
            return;
        }
        if self.items.back().is_some_and(|last| last.id() == item.id()) {
            return;
        }
        if self.items.len() >= self.max_size {
            self.items.pop_front(); // Remove oldest
        }
        self.items.push_back(item);
    }

    /// Most recent item (without removing)
    pub fn peek(&self) -> Option<&PlayableItem> {
        self.items.back()
    }

    /// All history items, most recent first (Recently Played order)
    pub fn recent(&self) -> Vec<&PlayableItem> {
        self.items.iter().rev().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50) // Default: 50 items
    }
}
