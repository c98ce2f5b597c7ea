//! Front-end state: cursor behavior and the key map.
//!
//! The playlist (tracks, cursor, selection) is shared with the engine; `App`
//! only keeps what the terminal front end needs on top of it.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
