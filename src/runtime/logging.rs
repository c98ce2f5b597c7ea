use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogSettings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Send `tracing` output to the configured log file.
///
/// Does nothing without `log.file`: the terminal belongs to the UI.
/// `RUST_LOG` overrides `log.level`.
pub fn init(settings: &LogSettings) -> Result<(), BoxError> {
    let Some(path) = &settings.file else {
        return Ok(());
    };

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)?,
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(Mutex::new(file))
        .try_init()
}
