//! Concurrent playback engine.
//!
//! Front ends drive a `PlaybackEngine` directly or through a `Player`
//! (which queues commands on a channel). While something plays, a stream
//! thread decodes the current track and feeds the output sink, and a clock
//! thread keeps the elapsed time. The front end learns about changes
//! through `UiNotify`.

mod cancel;
mod clock;
mod controller;
mod error;
mod notify;
mod player;
mod selector;
mod shared;
mod stream;
mod types;

pub use controller::Player;
pub use notify::UiEvent;
pub use player::PlaybackEngine;
pub use types::{EngineCmd, EngineOptions, PlaybackInfo, PlaybackState, Sequencing};

#[cfg(test)]
mod fakes;
