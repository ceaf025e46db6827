//! JavaScript-facing player handle

use super::adapter::HtmlAudioAdapter;
use crate::{command_for_key, PlayableItem, PlaybackController, PlayerConfig, SnapshotWatcher};
use js_sys::Function;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

type Controller = RefCell<PlaybackController<HtmlAudioAdapter>>;

/// JavaScript snapshot callbacks, called only while the controller is free
#[derive(Default)]
struct Listeners {
    callbacks: RefCell<Vec<(u32, Function)>>,
    watcher: RefCell<SnapshotWatcher>,
    next_handle: Cell<u32>,
}

/// Browser player
///
/// Wraps the playback controller and an `<audio>` element. Items are passed
/// as plain objects shaped like the serialized `PlayableItem`
/// (`{ type: "track" | "episode", ... }`).
#[wasm_bindgen]
pub struct WasmPlayer {
    inner: Rc<Controller>,
    listeners: Rc<Listeners>,
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Create a player; `config` may be `undefined` for defaults
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let config: PlayerConfig = if config.is_undefined() || config.is_null() {
            PlayerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid player config: {}", e)))?
        };

        let adapter = HtmlAudioAdapter::new()?;
        let inner = Rc::new(RefCell::new(PlaybackController::new(adapter, config)));

        let listeners = Rc::new(Listeners::default());

        let weak_inner: Weak<Controller> = Rc::downgrade(&inner);
        let weak_listeners = Rc::downgrade(&listeners);
        inner.borrow().adapter().set_waker(move || {
            let (Some(controller), Some(listeners)) = (weak_inner.upgrade(), weak_listeners.upgrade())
            else {
                return;
            };
            // Busy means an action is running; it pumps and notifies on completion
            let pumped = match controller.try_borrow_mut() {
                Ok(mut controller) => {
                    controller.pump_media_events();
                    true
                }
                Err(_) => false,
            };
            if pumped {
                notify_listeners(&controller, &listeners);
            }
        });

        Ok(Self { inner, listeners })
    }

    // ===== Playback Control =====

    /// Play a single item, replacing the queue
    pub fn play(&self, item: JsValue) -> Result<(), JsValue> {
        let item = parse_item(item)?;
        self.with_controller(|c| c.play(item))
    }

    /// Replace the queue and play from `start_index`
    #[wasm_bindgen(js_name = playQueue)]
    pub fn play_queue(&self, items: JsValue, start_index: usize) -> Result<(), JsValue> {
        let items: Vec<PlayableItem> = serde_wasm_bindgen::from_value(items)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse items: {}", e)))?;
        self.with_controller(|c| c.play_queue(items, start_index))
    }

    #[wasm_bindgen(js_name = playAt)]
    pub fn play_at(&self, index: usize) -> Result<(), JsValue> {
        self.with_controller(|c| c.play_at(index))
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.toggle_play())
    }

    pub fn pause(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.pause())
    }

    pub fn resume(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.resume())
    }

    pub fn next(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.next())
    }

    pub fn previous(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.previous())
    }

    // ===== Seeking =====

    /// Seek to position in seconds
    pub fn seek(&self, seconds: f64) -> Result<(), JsValue> {
        self.with_controller(|c| c.seek(seconds))
    }

    #[wasm_bindgen(js_name = seekBy)]
    pub fn seek_by(&self, delta_secs: f64) -> Result<(), JsValue> {
        self.with_controller(|c| c.seek_by(delta_secs))
    }

    // ===== Volume Control =====

    /// Set volume (0.0-1.0)
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, level: f32) -> Result<(), JsValue> {
        self.with_controller(|c| c.set_volume(level))
    }

    #[wasm_bindgen(js_name = toggleMute)]
    pub fn toggle_mute(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.toggle_mute())
    }

    // ===== Queue Management =====

    #[wasm_bindgen(js_name = toggleShuffle)]
    pub fn toggle_shuffle(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.toggle_shuffle())
    }

    #[wasm_bindgen(js_name = cycleRepeat)]
    pub fn cycle_repeat(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.cycle_repeat())
    }

    pub fn enqueue(&self, item: JsValue) -> Result<(), JsValue> {
        let item = parse_item(item)?;
        self.with_controller(|c| c.enqueue(item))
    }

    #[wasm_bindgen(js_name = clearQueue)]
    pub fn clear_queue(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.clear_queue())
    }

    /// Return to an empty session (call on logout)
    pub fn reset(&self) -> Result<(), JsValue> {
        self.with_controller(|c| c.reset())
    }

    // ===== Keyboard =====

    /// Apply a keyboard shortcut
    ///
    /// Returns `true` when the key was handled and the caller should
    /// `preventDefault()`.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&self, code: &str, typing_in_text_field: bool) -> Result<bool, JsValue> {
        self.with_controller(|c| {
            match command_for_key(code, typing_in_text_field, c.config()) {
                Some(command) => {
                    c.dispatch(command);
                    true
                }
                None => false,
            }
        })
    }

    // ===== State Queries =====

    /// Current snapshot as a plain object
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let controller = self
            .inner
            .try_borrow()
            .map_err(|_| JsValue::from_str("player is busy"))?;
        serde_wasm_bindgen::to_value(controller.snapshot())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Recently played items, most recent first
    #[wasm_bindgen(js_name = recentlyPlayed)]
    pub fn recently_played(&self) -> Result<JsValue, JsValue> {
        let controller = self
            .inner
            .try_borrow()
            .map_err(|_| JsValue::from_str("player is busy"))?;
        serde_wasm_bindgen::to_value(&controller.history().recent())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    // ===== Event Listeners =====

    /// Register a callback receiving every changed snapshot
    ///
    /// Callbacks run after the triggering action has released the player,
    /// so they may call back into it. Commands issued from a callback
    /// notify every listener again before the outer notification resumes.
    pub fn subscribe(&self, callback: Function) -> u32 {
        let handle = self.listeners.next_handle.get() + 1;
        self.listeners.next_handle.set(handle);
        self.listeners.callbacks.borrow_mut().push((handle, callback));
        handle
    }

    pub fn unsubscribe(&self, handle: u32) -> bool {
        let mut callbacks = self.listeners.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(id, _)| *id != handle);
        callbacks.len() != before
    }
}

impl WasmPlayer {
    /// Run an action, apply any events the adapter raised meanwhile, then
    /// notify listeners once the controller is released
    fn with_controller<R>(
        &self,
        action: impl FnOnce(&mut PlaybackController<HtmlAudioAdapter>) -> R,
    ) -> Result<R, JsValue> {
        let result = {
            let mut controller = self
                .inner
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("player is busy"))?;
            let result = action(&mut controller);
            controller.pump_media_events();
            result
        };
        notify_listeners(&self.inner, &self.listeners);
        Ok(result)
    }
}

/// Deliver the latest snapshot to every callback if it changed
fn notify_listeners(inner: &Controller, listeners: &Listeners) {
    let changed = match (inner.try_borrow(), listeners.watcher.try_borrow_mut()) {
        (Ok(controller), Ok(mut watcher)) => watcher.changed(controller.snapshot()),
        _ => None,
    };
    let snapshot = match changed {
        Some(snapshot) => snapshot,
        None => return,
    };

    // Cloned so callbacks can subscribe or unsubscribe while being called
    let callbacks: Vec<Function> = listeners
        .callbacks
        .borrow()
        .iter()
        .map(|(_, callback)| callback.clone())
        .collect();
    if callbacks.is_empty() {
        return;
    }

    let value = match serde_wasm_bindgen::to_value(&snapshot) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "failed to serialize snapshot for listeners");
            return;
        }
    };
    for callback in callbacks {
        if let Err(error) = callback.call1(&JsValue::NULL, &value) {
            debug!(?error, "snapshot listener threw");
        }
    }
}

fn parse_item(value: JsValue) -> Result<PlayableItem, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse item: {}", e)))
}
