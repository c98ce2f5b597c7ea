use std::path::PathBuf;

use thiserror::Error;

use crate::plugin::PluginError;

/// Why a track could not be started or kept playing.
///
/// None of these is fatal to the engine: each one stops or skips the
/// affected track and is reported to the front end as a message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no track at playlist position {0}")]
    NoTrack(usize),

    #[error("unsupported format or unreadable file: {}", path.display())]
    UnsupportedFormat {
        path: PathBuf,
        #[source]
        source: Option<PluginError>,
    },

    #[error("unable to initialize output plugin: {0}")]
    OutputInitFailed(#[source] PluginError),

    #[error("decoding stopped early: {0}")]
    DecodeTransient(#[source] PluginError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
