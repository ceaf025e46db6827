//! Player intents and keyboard bindings
//!
//! Views dispatch [`PlayerCommand`]s instead of calling the controller's
//! methods one by one; the global keyboard handler maps key codes to
//! commands with [`command_for_key`].

use crate::types::{PlayableItem, PlayerConfig};

/// Every intent the controller accepts
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Play a single item (replaces the queue)
    Play(PlayableItem),

    /// Play a list starting at `start_index`
    PlayQueue {
        items: Vec<PlayableItem>,
        start_index: usize,
    },

    /// Make the queue entry at this index current and play it
    PlayAt(usize),

    TogglePlay,
    Pause,
    Resume,
    Next,
    Previous,

    /// Seek to an absolute position in seconds
    Seek(f64),

    /// Seek relative to the current position
    SeekBy(f64),

    /// Set volume (0.0-1.0)
    SetVolume(f32),

    /// Change volume relative to the stored level
    AdjustVolume(f32),

    ToggleMute,
    ToggleShuffle,
    CycleRepeat,
    Enqueue(PlayableItem),
    ClearQueue,
}

/// Map a `KeyboardEvent.code` to a command
///
/// Returns `None` for unbound keys and whenever the user is typing in a text
/// field, so shortcuts never steal input.
pub fn command_for_key(
    code: &str,
    typing_in_text_field: bool,
    config: &PlayerConfig,
) -> Option<PlayerCommand> {
    if typing_in_text_field {
        return None;
    }

    let command = match code {
        "Space" => PlayerCommand::TogglePlay,
        "ArrowLeft" => PlayerCommand::SeekBy(-config.seek_step_secs),
        "ArrowRight" => PlayerCommand::SeekBy(config.seek_step_secs),
        "ArrowUp" => PlayerCommand::AdjustVolume(config.volume_step),
        "ArrowDown" => PlayerCommand::AdjustVolume(-config.volume_step),
        "KeyM" => PlayerCommand::ToggleMute,
        "KeyN" => PlayerCommand::Next,
        "KeyP" => PlayerCommand::Previous,
        _ => return None,
    };

    Some(command)
}
