use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::camera::Viewpoint;
use super::validate::{positive_or_default, WarnOnce};

pub const DEFAULT_GAZE_DISTANCE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// Bit set of world layers a ray query may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    pub fn layer(index: u32) -> Self {
        Self(1u32.checked_shl(index).unwrap_or(0))
    }

    pub fn contains_layer(self, index: u32) -> bool {
        self.0 & Self::layer(index).0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub object: ObjectId,
    pub distance: f32,
}

/// Scene object that reacts to being looked at.
pub trait LookTarget {
    fn on_look_enter(&mut self);
    fn on_look_stay(&mut self);
    fn on_look_exit(&mut self);
    fn target_name(&self) -> &str;
}

/// World queries the detector needs: one ray per frame and a way to reach the
/// look-target capability of whatever the ray hit.
pub trait GazeWorld {
    fn raycast(&self, ray: Ray, max_distance: f32, layers: LayerMask) -> Option<RayHit>;
    /// `None` when the object exists but does not react to gaze.
    fn look_target_mut(&mut self, object: ObjectId) -> Option<&mut dyn LookTarget>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GazeEvent {
    Idle,
    Entered {
        previous: Option<ObjectId>,
        current: ObjectId,
    },
    Stayed(ObjectId),
    Exited(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeSettings {
    pub max_distance: f32,
    pub target_layers: LayerMask,
    pub debug_logs: bool,
}

impl Default for GazeSettings {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_GAZE_DISTANCE,
            target_layers: LayerMask::ALL,
            debug_logs: true,
        }
    }
}

impl GazeSettings {
    pub(crate) fn validated(mut self) -> Self {
        self.max_distance =
            positive_or_default("gaze.max_distance", self.max_distance, DEFAULT_GAZE_DISTANCE);
        self
    }
}

#[derive(Debug, Clone)]
struct CurrentTarget {
    object: ObjectId,
    name: String,
}

/// Per-frame hover detection. At most one object is looked at at any time, and
/// every enter is matched by exactly one exit before the next enter.
#[derive(Debug)]
pub struct GazeDetector {
    settings: GazeSettings,
    current: Option<CurrentTarget>,
    missing_viewpoint: WarnOnce,
}

impl Default for GazeDetector {
    fn default() -> Self {
        Self::new(GazeSettings::default())
    }
}

impl GazeDetector {
    pub fn new(settings: GazeSettings) -> Self {
        Self {
            settings: settings.validated(),
            current: None,
            missing_viewpoint: WarnOnce::default(),
        }
    }

    pub fn settings(&self) -> &GazeSettings {
        &self.settings
    }

    /// Casts the frame's ray and drives enter/stay/exit on the affected targets.
    ///
    /// Without a viewpoint the frame is skipped and the current target is left
    /// untouched.
    pub fn update<W>(&mut self, viewpoint: Option<&Viewpoint>, world: &mut W) -> GazeEvent
    where
        W: GazeWorld + ?Sized,
    {
        let Some(viewpoint) = viewpoint else {
            if self.missing_viewpoint.should_warn() {
                warn!("gaze detector has no viewpoint; detection skipped until one is assigned");
            }
            return GazeEvent::Idle;
        };
        self.missing_viewpoint.reset();

        let hit = world
            .raycast(
                viewpoint.ray(),
                self.settings.max_distance,
                self.settings.target_layers,
            )
            .map(|hit| hit.object)
            .filter(|object| world.look_target_mut(*object).is_some());

        match (hit, self.current.as_ref().map(|current| current.object)) {
            (Some(object), Some(current)) if object == current => {
                if let Some(target) = world.look_target_mut(object) {
                    target.on_look_stay();
                }
                GazeEvent::Stayed(object)
            }
            (Some(object), previous) => {
                self.exit_current(world);
                let Some(target) = world.look_target_mut(object) else {
                    return previous.map_or(GazeEvent::Idle, GazeEvent::Exited);
                };
                target.on_look_enter();
                let name = target.target_name().to_owned();
                if self.settings.debug_logs {
                    debug!(object = object.0, target_name = %name, "gaze_enter");
                }
                self.current = Some(CurrentTarget { object, name });
                GazeEvent::Entered {
                    previous,
                    current: object,
                }
            }
            (None, Some(previous)) => {
                self.exit_current(world);
                GazeEvent::Exited(previous)
            }
            (None, None) => GazeEvent::Idle,
        }
    }

    /// Exits the current target, if any. Used when the owning scene unloads.
    pub fn clear<W>(&mut self, world: &mut W)
    where
        W: GazeWorld + ?Sized,
    {
        self.exit_current(world);
    }

    pub fn current_target(&self) -> Option<ObjectId> {
        self.current.as_ref().map(|current| current.object)
    }

    pub fn current_target_name(&self) -> Option<&str> {
        self.current.as_ref().map(|current| current.name.as_str())
    }

    pub fn is_looking_at_target(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_looking_at(&self, object: ObjectId) -> bool {
        self.current_target() == Some(object)
    }

    fn exit_current<W>(&mut self, world: &mut W)
    where
        W: GazeWorld + ?Sized,
    {
        let Some(previous) = self.current.take() else {
            return;
        };
        // A target removed from the world since the last frame gets no exit.
        if let Some(target) = world.look_target_mut(previous.object) {
            target.on_look_exit();
        }
        if self.settings.debug_logs {
            debug!(object = previous.object.0, target_name = %previous.name, "gaze_exit");
        }
    }
}
