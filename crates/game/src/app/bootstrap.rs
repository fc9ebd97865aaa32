use engine::{resolve_app_paths, CursorMode, InputMode, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay;
use super::progress::{ProgressStore, ProgressTracker};
use super::settings::{load_settings, GameSettings, SettingsError};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) night: Box<dyn Scene>,
    pub(crate) office: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Nightwatch Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_root_resolved");
    let settings = load_settings(&paths.config_dir)?;
    let progress = ProgressTracker::open(ProgressStore::new(&paths.save_dir)).into_shared();

    let (night, office) = gameplay::build_scene_pair(&settings, &progress);
    Ok(AppWiring {
        config: loop_config(&settings),
        night,
        office,
    })
}

/// `target_fps` becomes the render cap; the input mode decides cursor capture.
pub(crate) fn loop_config(settings: &GameSettings) -> LoopConfig {
    LoopConfig {
        max_render_fps: Some(settings.target_fps),
        cursor_mode: match settings.input_mode {
            InputMode::Pointer => CursorMode::Locked,
            InputMode::Touch => CursorMode::Free,
        },
        ..LoopConfig::default()
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
