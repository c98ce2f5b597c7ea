use std::io;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace};

use super::player::PlaybackEngine;
use super::types::{EngineCmd, PlaybackInfo};

/// Queued front end for a `PlaybackEngine`.
///
/// Key handlers send `EngineCmd`s and return immediately; a dedicated
/// thread applies them in order. Reads go straight to the engine.
pub struct Player {
    tx: Sender<EngineCmd>,
    engine: Arc<PlaybackEngine>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    pub fn new(engine: PlaybackEngine) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let engine = Arc::new(engine);
        let handle = spawn_command_thread(Arc::clone(&engine), rx)?;

        Ok(Self {
            tx,
            engine,
            join: Mutex::new(Some(handle)),
        })
    }

    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    pub fn info(&self) -> PlaybackInfo {
        self.engine.info()
    }

    pub fn send(&self, cmd: EngineCmd) -> Result<(), SendError<EngineCmd>> {
        self.tx.send(cmd)
    }

    /// Stop playback and wait for the command thread to finish.
    pub fn quit(&self) {
        let _ = self.send(EngineCmd::Quit);

        let handle = self
            .join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("engine command thread panicked");
            }
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.quit();
    }
}

fn spawn_command_thread(
    engine: Arc<PlaybackEngine>,
    rx: Receiver<EngineCmd>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("engine-commands".into())
        .spawn(move || {
            for cmd in rx {
                trace!(?cmd, "engine command");
                if !engine.handle(cmd) {
                    break;
                }
            }
            engine.stop();
            debug!("engine command thread finished");
        })
}
