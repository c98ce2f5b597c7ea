//! Music library discovery: turns a directory tree into playlist tracks.
//!
//! Scanning and tag reading live outside the playback engine; the engine
//! only ever sees the resulting `Track` values through the playlist.

mod display;
mod model;
mod scan;

pub use display::field_text;
pub use model::Track;
pub use scan::scan;
