use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::atomic_io::write_text_atomic;

pub(crate) const PROGRESS_FILE: &str = "progress.json";

#[derive(Debug, Error)]
pub(crate) enum ProgressError {
    #[error("failed to read progress file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse progress file {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode progress: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write progress file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GameProgress {
    pub(crate) current_night: u32,
    pub(crate) total_deaths: u32,
}

impl Default for GameProgress {
    fn default() -> Self {
        Self {
            current_night: 1,
            total_deaths: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub(crate) fn new(save_dir: &Path) -> Self {
        Self {
            path: save_dir.join(PROGRESS_FILE),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means a fresh game.
    pub(crate) fn load(&self) -> Result<GameProgress, ProgressError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Ok(GameProgress::default());
            }
            Err(source) => {
                return Err(ProgressError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        serde_path_to_error::deserialize::<_, GameProgress>(&mut deserializer).map_err(|error| {
            let json_path = error.path().to_string();
            ProgressError::Parse {
                path: self.path.clone(),
                json_path,
                source: error.into_inner(),
            }
        })
    }

    pub(crate) fn save(&self, progress: &GameProgress) -> Result<(), ProgressError> {
        let json = serde_json::to_string_pretty(progress).map_err(ProgressError::Encode)?;
        write_text_atomic(&self.path, &json).map_err(|source| ProgressError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Progress shared by both scenes. Persistence failures are logged and play
/// continues with the in-memory state.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    store: ProgressStore,
    progress: GameProgress,
}

pub(crate) type SharedProgress = Rc<RefCell<ProgressTracker>>;

impl ProgressTracker {
    pub(crate) fn open(store: ProgressStore) -> Self {
        let progress = match store.load() {
            Ok(progress) => progress,
            Err(error) => {
                warn!(error = %error, "progress_load_failed_starting_fresh");
                GameProgress::default()
            }
        };
        info!(
            night = progress.current_night,
            deaths = progress.total_deaths,
            "progress_loaded"
        );
        Self { store, progress }
    }

    pub(crate) fn into_shared(self) -> SharedProgress {
        Rc::new(RefCell::new(self))
    }

    pub(crate) fn progress(&self) -> GameProgress {
        self.progress
    }

    pub(crate) fn complete_night(&mut self) {
        self.progress.current_night = self.progress.current_night.saturating_add(1);
        info!(next_night = self.progress.current_night, "night_completed");
        self.persist();
    }

    pub(crate) fn record_death(&mut self) {
        self.progress.total_deaths = self.progress.total_deaths.saturating_add(1);
        info!(deaths = self.progress.total_deaths, "death_recorded");
        self.persist();
    }

    fn persist(&self) {
        if let Err(error) = self.store.save(&self.progress) {
            warn!(error = %error, "progress_save_failed");
        }
    }
}
