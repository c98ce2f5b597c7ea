//! Callbacks from the engine to whatever renders it.

use std::sync::mpsc::Sender;

/// Events delivered to a channel-based front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Redraw,
    Message(String),
}

/// Receives redraw requests and status messages.
///
/// Called from engine threads (stream, clock) as well as from the thread
/// issuing commands. Implementations must not call back into the engine
/// synchronously; queue the work instead.
pub trait UiNotify: Send + Sync {
    fn redraw(&self);

    fn message(&self, text: &str);
}

impl UiNotify for Sender<UiEvent> {
    fn redraw(&self) {
        // A closed channel just means nobody is watching anymore.
        let _ = self.send(UiEvent::Redraw);
    }

    fn message(&self, text: &str) {
        let _ = self.send(UiEvent::Message(text.to_string()));
    }
}

/// Headless front end.
impl UiNotify for () {
    fn redraw(&self) {}

    fn message(&self, _text: &str) {}
}
