//! Queue manager
//!
//! Ordering and current-position semantics, independent of playback:
//! - Live order (possibly shuffled) with a current index
//! - Canonical order snapshot for restoring after unshuffle
//! - Repeat mode consulted when advancing past the end

use crate::shuffle::shuffle_with_current_first;
use crate::types::{PlayableItem, RepeatMode};
use rand::Rng;
use tracing::debug;

/// Outcome of a "previous" request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    /// Far enough into the item: restart it, index unchanged
    Restart,

    /// Index moved back by one
    Moved,

    /// Already at the first item; nothing changed
    AtStart,
}

/// Play queue
///
/// Structure:
/// ```text
/// items:     [C, A, D, B]   (live order, shuffled)
/// index:      ^ current
/// canonical: [A, B, C, D]   (order as loaded, restored on unshuffle)
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Live order
    items: Vec<PlayableItem>,

    /// Order as loaded (never shuffled)
    canonical: Vec<PlayableItem>,

    /// Current position; `None` only when `items` is empty
    index: Option<usize>,

    /// Whether the live order is shuffled
    shuffled: bool,

    repeat: RepeatMode,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty queue with initial shuffle and repeat settings
    pub fn with_modes(shuffled: bool, repeat: RepeatMode) -> Self {
        Self {
            shuffled,
            repeat,
            ..Self::default()
        }
    }

    /// Install a new ordered list
    ///
    /// Items without a valid locator are dropped. If nothing survives the
    /// existing queue is kept and `false` is returned.
    pub fn replace(&mut self, items: Vec<PlayableItem>, start_index: usize) -> bool {
        self.replace_with(items, start_index, &mut rand::thread_rng())
    }

    /// [`Queue::replace`] with an explicit random source
    pub fn replace_with<R: Rng + ?Sized>(
        &mut self,
        items: Vec<PlayableItem>,
        start_index: usize,
        rng: &mut R,
    ) -> bool {
        let requested = items.len();
        let mut start = None;
        let mut accepted = Vec::with_capacity(requested);

        for (original_index, item) in items.into_iter().enumerate() {
            if !item.has_valid_locator() {
                debug!(id = item.id(), "dropping item without a valid media locator");
                continue;
            }
            if start.is_none() && original_index >= start_index {
                start = Some(accepted.len());
            }
            accepted.push(item);
        }

        if accepted.is_empty() {
            debug!(requested, "no playable items, keeping existing queue");
            return false;
        }

        // Requested start was past the last survivor
        let start = start.unwrap_or(accepted.len() - 1);

        self.canonical.clone_from(&accepted);
        self.items = accepted;
        self.index = Some(start);

        if self.shuffled {
            self.index = shuffle_with_current_first(&mut self.items, start, rng);
        }

        true
    }

    /// Move forward one item
    ///
    /// Wraps to the start under repeat-all. Returns `None` when the queue is
    /// exhausted; the index then stays on the last item.
    pub fn advance(&mut self) -> Option<&PlayableItem> {
        let index = self.index?;
        let next = index + 1;

        if next < self.items.len() {
            self.index = Some(next);
        } else if self.repeat == RepeatMode::All {
            self.index = Some(0);
        } else {
            debug!(len = self.items.len(), "queue exhausted");
            return None;
        }

        self.current()
    }

    /// Handle a "previous" request given the current elapsed time
    ///
    /// Past `threshold_secs` this is a restart rather than a step back.
    /// Never wraps from the first item to the last.
    pub fn retreat(&mut self, elapsed_secs: f64, threshold_secs: f64) -> Retreat {
        if elapsed_secs > threshold_secs {
            return Retreat::Restart;
        }

        match self.index {
            Some(index) if index > 0 => {
                self.index = Some(index - 1);
                Retreat::Moved
            }
            _ => Retreat::AtStart,
        }
    }

    /// Flip shuffle on or off
    pub fn toggle_shuffle(&mut self) {
        self.toggle_shuffle_with(&mut rand::thread_rng());
    }

    /// [`Queue::toggle_shuffle`] with an explicit random source
    ///
    /// The flag flips even for empty or single-item queues so it always
    /// reflects the user's choice.
    pub fn toggle_shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.shuffled {
            let current_id = self.current().map(|item| item.id().to_string());
            self.items.clone_from(&self.canonical);
            self.index = if self.items.is_empty() {
                None
            } else {
                let restored = current_id
                    .and_then(|id| self.items.iter().position(|item| item.id() == id));
                Some(restored.unwrap_or(0))
            };
            self.shuffled = false;
        } else {
            if let Some(index) = self.index {
                self.index = shuffle_with_current_first(&mut self.items, index, rng);
            }
            self.shuffled = true;
        }
    }

    /// Cycle Off -> All -> One -> Off, returning the new mode
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycled();
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    /// Append to both live and canonical order
    ///
    /// Returns `false` (and leaves the queue untouched) for invalid items.
    pub fn enqueue(&mut self, item: PlayableItem) -> bool {
        if !item.has_valid_locator() {
            debug!(id = item.id(), "refusing to enqueue item without a valid media locator");
            return false;
        }

        self.canonical.push(item.clone());
        self.items.push(item);
        if self.index.is_none() {
            self.index = Some(0);
        }
        true
    }

    /// Make the item at `index` current
    pub fn jump_to(&mut self, index: usize) -> Option<&PlayableItem> {
        if index >= self.items.len() {
            return None;
        }
        self.index = Some(index);
        self.current()
    }

    /// Clear entire queue (shuffle and repeat settings are kept)
    pub fn clear(&mut self) {
        self.items.clear();
        self.canonical.clear();
        self.index = None;
    }

    /// Item at the current index
    pub fn current(&self) -> Option<&PlayableItem> {
        self.index.and_then(|index| self.items.get(index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    /// Live order
    pub fn items(&self) -> &[PlayableItem] {
        &self.items
    }

    /// Order as loaded
    pub fn canonical(&self) -> &[PlayableItem] {
        &self.canonical
    }

    pub fn get(&self, index: usize) -> Option<&PlayableItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }
}
