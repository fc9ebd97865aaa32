use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{
    ControllerSettings, CrouchSettings, FixedViewSettings, GazeSettings, InputMode,
    JoystickSettings,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const SETTINGS_FILE: &str = "settings.json";
pub(crate) const DEFAULT_TARGET_FPS: u32 = 120;

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse settings file {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Screen rectangle in bottom-left-origin window pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct RectSetting {
    pub(crate) min: [f32; 2],
    pub(crate) size: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct TouchLayout {
    pub(crate) joystick_center: [f32; 2],
    pub(crate) joystick_radius: f32,
    pub(crate) crouch_button: RectSetting,
    pub(crate) camera_dead_zone: Option<RectSetting>,
}

impl Default for TouchLayout {
    fn default() -> Self {
        Self {
            joystick_center: [180.0, 180.0],
            joystick_radius: 130.0,
            crouch_button: RectSetting {
                min: [1100.0, 40.0],
                size: [140.0, 140.0],
            },
            camera_dead_zone: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GameSettings {
    pub(crate) target_fps: u32,
    pub(crate) input_mode: InputMode,
    pub(crate) controller: ControllerSettings,
    pub(crate) gaze: GazeSettings,
    pub(crate) fixed_view: FixedViewSettings,
    pub(crate) crouch: CrouchSettings,
    pub(crate) joystick: JoystickSettings,
    pub(crate) touch_layout: TouchLayout,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            input_mode: InputMode::default(),
            controller: ControllerSettings::default(),
            gaze: GazeSettings::default(),
            fixed_view: FixedViewSettings::default(),
            crouch: CrouchSettings::default(),
            joystick: JoystickSettings::default(),
            touch_layout: TouchLayout::default(),
        }
    }
}

impl GameSettings {
    /// Component sections are validated by the engine types that own them.
    fn validated(mut self) -> Self {
        if self.target_fps == 0 {
            warn!(
                value = self.target_fps,
                default = DEFAULT_TARGET_FPS,
                "target_fps must be positive; reset to default"
            );
            self.target_fps = DEFAULT_TARGET_FPS;
        }
        self
    }
}

pub(crate) fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

/// Missing file means defaults.
pub(crate) fn load_settings(config_dir: &Path) -> Result<GameSettings, SettingsError> {
    let path = settings_path(config_dir);
    if !path.exists() {
        info!(path = %path.display(), "settings_missing_using_defaults");
        return Ok(GameSettings::default());
    }

    let raw = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
        path: path.clone(),
        source,
    })?;
    let settings = parse_settings_json(&path, &raw)?;
    info!(
        path = %path.display(),
        input_mode = ?settings.input_mode,
        target_fps = settings.target_fps,
        "settings_loaded"
    );
    Ok(settings)
}

fn parse_settings_json(path: &Path, raw: &str) -> Result<GameSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, GameSettings>(&mut deserializer)
        .map(GameSettings::validated)
        .map_err(|error| {
            let json_path = error.path().to_string();
            SettingsError::Parse {
                path: path.to_path_buf(),
                json_path,
                source: error.into_inner(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(dir.path()).expect("defaults");
        assert_eq!(settings, GameSettings::default());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            settings_path(dir.path()),
            r#"{
                "input_mode": "touch",
                "controller": { "walk_speed": 3.5 },
                "fixed_view": { "limit_rotation": false },
                "touch_layout": { "camera_dead_zone": { "min": [0, 600], "size": [1280, 120] } }
            }"#,
        )
        .expect("write settings");

        let settings = load_settings(dir.path()).expect("settings");

        assert_eq!(settings.input_mode, InputMode::Touch);
        assert_eq!(settings.controller.walk_speed, 3.5);
        assert_eq!(settings.controller.eye_height, ControllerSettings::default().eye_height);
        assert!(!settings.fixed_view.limit_rotation);
        assert_eq!(settings.target_fps, DEFAULT_TARGET_FPS);
        assert!(settings.touch_layout.camera_dead_zone.is_some());
    }

    #[test]
    fn parse_error_names_json_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            settings_path(dir.path()),
            r#"{ "controller": { "walk_speed": "fast" } }"#,
        )
        .expect("write settings");

        let error = load_settings(dir.path()).expect_err("bad type");

        match error {
            SettingsError::Parse { json_path, .. } => assert_eq!(json_path, "controller.walk_speed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn clamped_yaw_policy_is_read_from_tagged_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            settings_path(dir.path()),
            r#"{ "controller": { "yaw_policy": { "mode": "clamped", "min": -45, "max": 45 } } }"#,
        )
        .expect("write settings");

        let settings = load_settings(dir.path()).expect("settings");

        assert_eq!(
            settings.controller.yaw_policy,
            engine::YawPolicy::Clamped {
                min: -45.0,
                max: 45.0
            }
        );
    }

    #[test]
    fn zero_target_fps_resets_to_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(settings_path(dir.path()), r#"{ "target_fps": 0 }"#).expect("write settings");

        let settings = load_settings(dir.path()).expect("settings");

        assert_eq!(settings.target_fps, DEFAULT_TARGET_FPS);
    }
}
