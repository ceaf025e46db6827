//! `<audio>` element adapter

use crate::adapter::{LoadTicket, MediaAdapter, MediaEventKind, MediaEventSink};
use crate::error::MediaFailure;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{DomException, Event, HtmlAudioElement, MediaError};

type Waker = Rc<dyn Fn()>;

/// State shared between the adapter and its DOM listeners
#[derive(Default)]
struct Shared {
    sink: Option<MediaEventSink>,
    ticket: LoadTicket,
    waker: Option<Waker>,
}

type Listener = Closure<dyn FnMut(Event)>;

/// Media adapter backed by a single `HtmlAudioElement`
pub struct HtmlAudioAdapter {
    element: HtmlAudioElement,
    shared: Rc<RefCell<Shared>>,
    listeners: Vec<(&'static str, Listener)>,
}

impl HtmlAudioAdapter {
    /// Create a detached `<audio>` element and wrap it
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self::from_element(HtmlAudioElement::new()?))
    }

    /// Wrap an existing element (e.g. one rendered by the page)
    pub fn from_element(element: HtmlAudioElement) -> Self {
        let mut adapter = Self {
            element,
            shared: Rc::new(RefCell::new(Shared::default())),
            listeners: Vec::new(),
        };
        adapter.bind_listeners();
        adapter
    }

    /// Callback run after every reported event, used to drive the controller
    pub fn set_waker(&self, waker: impl Fn() + 'static) {
        self.shared.borrow_mut().waker = Some(Rc::new(waker));
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }

    fn bind_listeners(&mut self) {
        self.listen("timeupdate", |element| {
            Some(MediaEventKind::TimeUpdate(element.current_time()))
        });
        self.listen("loadedmetadata", |element| {
            Some(MediaEventKind::MetadataReady {
                duration_secs: element.duration(),
            })
        });
        self.listen("ended", |_| Some(MediaEventKind::Ended));
        self.listen("waiting", |_| Some(MediaEventKind::Buffering(true)));
        self.listen("playing", |_| Some(MediaEventKind::Buffering(false)));
        self.listen("canplay", |_| Some(MediaEventKind::Buffering(false)));
        self.listen("error", |element| {
            let failure = element
                .error()
                .map(|error| classify_media_error(&error))
                .unwrap_or_else(|| MediaFailure::Other("unknown media error".to_string()));
            Some(MediaEventKind::Error(failure))
        });
    }

    fn listen<F>(&mut self, name: &'static str, translate: F)
    where
        F: Fn(&HtmlAudioElement) -> Option<MediaEventKind> + 'static,
    {
        let element = self.element.clone();
        let shared = Rc::clone(&self.shared);
        let listener: Listener = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(kind) = translate(&element) {
                report(&shared, None, kind);
            }
        }) as Box<dyn FnMut(Event)>);

        if let Err(error) = self
            .element
            .add_event_listener_with_callback(name, listener.as_ref().unchecked_ref())
        {
            warn!(event = name, ?error, "failed to bind media listener");
            return;
        }
        self.listeners.push((name, listener));
    }
}

impl MediaAdapter for HtmlAudioAdapter {
    fn subscribe(&mut self, sink: MediaEventSink) {
        self.shared.borrow_mut().sink = Some(sink);
    }

    fn load(&mut self, ticket: LoadTicket, locator: &str) {
        self.shared.borrow_mut().ticket = ticket;
        if let Err(error) = self.element.pause() {
            debug!(?error, "pause before load failed");
        }
        self.element.set_src(locator);
        self.element.load();
    }

    fn play(&mut self, ticket: LoadTicket) {
        let promise = match self.element.play() {
            Ok(promise) => promise,
            Err(error) => {
                let failure = classify_rejection(&error);
                report(&self.shared, Some(ticket), MediaEventKind::PlayFailed(failure));
                return;
            }
        };

        // Resolution is reported with the ticket it was issued for
        let shared = Rc::clone(&self.shared);
        spawn_local(async move {
            let kind = match JsFuture::from(promise).await {
                Ok(_) => MediaEventKind::PlayStarted,
                Err(error) => MediaEventKind::PlayFailed(classify_rejection(&error)),
            };
            report(&shared, Some(ticket), kind);
        });
    }

    fn pause(&mut self) {
        if let Err(error) = self.element.pause() {
            debug!(?error, "pause failed");
        }
    }

    fn seek(&mut self, seconds: f64) {
        let duration = self.element.duration();
        let target = if duration.is_finite() {
            seconds.clamp(0.0, duration)
        } else {
            seconds.max(0.0)
        };
        self.element.set_current_time(target);
    }

    fn set_volume(&mut self, level: f32) {
        self.element.set_volume(f64::from(level.clamp(0.0, 1.0)));
    }

    fn set_muted(&mut self, muted: bool) {
        self.element.set_muted(muted);
    }
}

impl Drop for HtmlAudioAdapter {
    fn drop(&mut self) {
        for (name, listener) in self.listeners.drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        let _ = self.element.pause();
    }
}

/// Emit an event (tagged with `ticket`, or the latest load) and wake the owner
fn report(shared: &Rc<RefCell<Shared>>, ticket: Option<LoadTicket>, kind: MediaEventKind) {
    let waker = match shared.try_borrow() {
        Ok(shared) => {
            let ticket = ticket.unwrap_or(shared.ticket);
            if let Some(sink) = &shared.sink {
                sink.emit(ticket, kind);
            }
            shared.waker.clone()
        }
        Err(_) => {
            warn!("media event raised during adapter update, dropped");
            None
        }
    };

    if let Some(wake) = waker {
        (*wake)();
    }
}

/// Map a rejected `play()` promise to a failure
fn classify_rejection(error: &JsValue) -> MediaFailure {
    match error.dyn_ref::<DomException>() {
        Some(exception) => match exception.name().as_str() {
            "AbortError" => MediaFailure::Aborted,
            "NotAllowedError" => MediaFailure::AutoplayBlocked,
            "NotSupportedError" => MediaFailure::Unsupported,
            other => MediaFailure::Other(other.to_string()),
        },
        None => MediaFailure::Other(
            error
                .as_string()
                .unwrap_or_else(|| "play request rejected".to_string()),
        ),
    }
}

fn classify_media_error(error: &MediaError) -> MediaFailure {
    match error.code() {
        MediaError::MEDIA_ERR_ABORTED => MediaFailure::Aborted,
        MediaError::MEDIA_ERR_NETWORK => MediaFailure::Network,
        MediaError::MEDIA_ERR_DECODE => MediaFailure::Decode,
        MediaError::MEDIA_ERR_SRC_NOT_SUPPORTED => MediaFailure::Unsupported,
        code => MediaFailure::Other(format!("media error code {}", code)),
    }
}
