//! WASM bindings for cadence-playback
//!
//! Browser media adapter over an `<audio>` element plus a JavaScript-facing
//! player handle.

pub mod adapter;
pub mod player;

pub use adapter::HtmlAudioAdapter;
pub use player::WasmPlayer;
