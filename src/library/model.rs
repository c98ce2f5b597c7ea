use std::path::PathBuf;
use std::time::Duration;

/// One playable file plus the metadata cached for it.
///
/// `path` is the track's identity; everything else is a cache that may be
/// refreshed (the engine updates `duration` when asked to).
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub display: String,
}

impl Track {
    /// A track known only by its file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            display: title.clone(),
            title,
            path,
            artist: None,
            album: None,
            duration: None,
        }
    }
}
