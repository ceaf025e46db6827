//! Queue randomization
//!
//! Fisher-Yates via `rand`, keeping the current item pinned at the front.

use crate::types::PlayableItem;
use rand::seq::SliceRandom;
use rand::Rng;

/// Reorder `items` so the item at `current` leads and the rest are shuffled
///
/// Returns the new index of the current item (always 0 when non-empty).
pub fn shuffle_with_current_first<R: Rng + ?Sized>(
    items: &mut Vec<PlayableItem>,
    current: usize,
    rng: &mut R,
) -> Option<usize> {
    if items.is_empty() {
        return None;
    }

    let current = current.min(items.len() - 1);
    let pinned = items.remove(current);
    items.shuffle(rng);
    items.insert(0, pinned);

    Some(0)
}
