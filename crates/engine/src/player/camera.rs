use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::gaze::Ray;

pub const FULL_TURN_DEGREES: f32 = 360.0;
pub const DEFAULT_MIN_YAW: f32 = -80.0;
pub const DEFAULT_MAX_YAW: f32 = 80.0;
pub const DEFAULT_MIN_PITCH: f32 = -90.0;
pub const DEFAULT_MAX_PITCH: f32 = 90.0;

/// How accumulated yaw is kept in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum YawPolicy {
    /// Held inside `[min, max]` degrees; used for restricted-view cameras.
    Clamped { min: f32, max: f32 },
    /// Reduced into `[0, 360)` degrees; used for free-look cameras.
    Wrapped,
}

impl Default for YawPolicy {
    fn default() -> Self {
        Self::Wrapped
    }
}

impl YawPolicy {
    pub fn apply(self, yaw: f32) -> f32 {
        match self {
            Self::Clamped { min, max } => yaw.max(min).min(max),
            Self::Wrapped => wrap_degrees(yaw),
        }
    }

    pub(crate) fn validated(self) -> Self {
        match self {
            Self::Clamped { min, max } if !(min < max) => {
                warn!(
                    min,
                    max,
                    default_min = DEFAULT_MIN_YAW,
                    default_max = DEFAULT_MAX_YAW,
                    "min yaw must be less than max yaw; reset to defaults"
                );
                Self::Clamped {
                    min: DEFAULT_MIN_YAW,
                    max: DEFAULT_MAX_YAW,
                }
            }
            other => other,
        }
    }
}

pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(FULL_TURN_DEGREES);
    // rem_euclid can round tiny negative inputs up to exactly 360.
    if wrapped >= FULL_TURN_DEGREES {
        0.0
    } else {
        wrapped
    }
}

/// Pitch is always clamped, never wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchRange {
    pub min: f32,
    pub max: f32,
}

impl Default for PitchRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_PITCH,
            max: DEFAULT_MAX_PITCH,
        }
    }
}

impl PitchRange {
    pub fn apply(self, pitch: f32) -> f32 {
        pitch.max(self.min).min(self.max)
    }

    pub(crate) fn validated(self) -> Self {
        if self.min <= self.max {
            return self;
        }
        warn!(
            min = self.min,
            max = self.max,
            "min pitch must not exceed max pitch; reset to defaults"
        );
        Self::default()
    }
}

/// Yaw and pitch in degrees. Positive yaw turns right, positive pitch looks down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LookOrientation {
    pub yaw: f32,
    pub pitch: f32,
}

impl LookOrientation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            0.0,
        )
    }

    pub fn yaw_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw.to_radians())
    }
}

/// Camera transform the core reads rays and movement axes from.
///
/// Basis convention: +Y up, +Z forward, +X right.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewpoint {
    pub position: Vec3,
    pub orientation: LookOrientation,
}

impl Viewpoint {
    pub fn new(position: Vec3, orientation: LookOrientation) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation.rotation() * Vec3::Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation.rotation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation.rotation() * Vec3::Y
    }

    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }

    /// Forward and right projected onto the ground plane and re-normalized.
    ///
    /// Looking straight up or down leaves no horizontal forward component, so the
    /// yaw-only basis is used in that case.
    pub fn horizontal_basis(&self) -> (Vec3, Vec3) {
        let flatten = |axis: Vec3| Vec3::new(axis.x, 0.0, axis.z).normalize_or_zero();
        let forward = flatten(self.forward());
        let right = flatten(self.right());
        if forward == Vec3::ZERO || right == Vec3::ZERO {
            let yaw = self.orientation.yaw_rotation();
            return (yaw * Vec3::Z, yaw * Vec3::X);
        }
        (forward, right)
    }
}
