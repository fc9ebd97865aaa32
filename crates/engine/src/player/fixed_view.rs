use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::actor::{Actor, CharacterBody};
use super::buttons::{ButtonPairInput, RotationButtonHandle};
use super::camera::{
    wrap_degrees, LookOrientation, Viewpoint, YawPolicy, DEFAULT_MAX_YAW, DEFAULT_MIN_YAW,
};
use super::controller::PlayerSignal;
use super::source::InputSource;
use super::validate::{clamp_with_warning, WarnOnce};
use crate::app::FrameContext;

pub const MIN_SPEED_MULTIPLIER: f32 = 0.1;
pub const MAX_SPEED_MULTIPLIER: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedViewSettings {
    pub limit_rotation: bool,
    pub min_yaw: f32,
    pub max_yaw: f32,
    pub rotation_speed_multiplier: f32,
}

impl Default for FixedViewSettings {
    fn default() -> Self {
        Self {
            limit_rotation: true,
            min_yaw: DEFAULT_MIN_YAW,
            max_yaw: DEFAULT_MAX_YAW,
            rotation_speed_multiplier: 1.0,
        }
    }
}

impl FixedViewSettings {
    pub(crate) fn validated(self) -> Self {
        let (min_yaw, max_yaw) = match (YawPolicy::Clamped {
            min: self.min_yaw,
            max: self.max_yaw,
        })
        .validated()
        {
            YawPolicy::Clamped { min, max } => (min, max),
            YawPolicy::Wrapped => (DEFAULT_MIN_YAW, DEFAULT_MAX_YAW),
        };
        Self {
            limit_rotation: self.limit_rotation,
            min_yaw,
            max_yaw,
            rotation_speed_multiplier: clamp_with_warning(
                "fixed_view.rotation_speed_multiplier",
                self.rotation_speed_multiplier,
                MIN_SPEED_MULTIPLIER,
                MAX_SPEED_MULTIPLIER,
            ),
        }
    }

    fn yaw_policy(&self) -> YawPolicy {
        if self.limit_rotation {
            YawPolicy::Clamped {
                min: self.min_yaw,
                max: self.max_yaw,
            }
        } else {
            YawPolicy::Wrapped
        }
    }
}

/// Discrete on-screen actions offered by the restricted camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Hide,
    OpenCamera,
    Custom(String),
}

/// Restricted camera turned only by a pair of rotation buttons.
///
/// Yaw is an offset from the viewpoint's base orientation and is applied every
/// tick, whatever the actor is doing.
pub struct FixedViewController {
    settings: FixedViewSettings,
    input: ButtonPairInput,
    yaw: f32,
    base: LookOrientation,
    viewpoint: Option<Viewpoint>,
    missing_viewpoint: WarnOnce,
}

impl FixedViewController {
    pub fn new(settings: FixedViewSettings, input: ButtonPairInput) -> Self {
        let settings = settings.validated();
        info!(
            limit_rotation = settings.limit_rotation,
            min_yaw = settings.min_yaw,
            max_yaw = settings.max_yaw,
            "fixed_view_activated"
        );
        Self {
            settings,
            input,
            yaw: 0.0,
            base: LookOrientation::default(),
            viewpoint: None,
            missing_viewpoint: WarnOnce::default(),
        }
    }

    /// The viewpoint's orientation becomes the zero-yaw base.
    pub fn attach_viewpoint(&mut self, viewpoint: Viewpoint) {
        self.base = viewpoint.orientation;
        self.viewpoint = Some(viewpoint);
        self.missing_viewpoint.reset();
        self.sync_viewpoint();
    }

    pub fn detach_viewpoint(&mut self) {
        self.viewpoint = None;
    }

    pub fn update(&mut self, ctx: &FrameContext<'_>) {
        if self.viewpoint.is_none() {
            if self.missing_viewpoint.should_warn() {
                warn!("fixed view has no viewpoint; rotation skipped until one is attached");
            }
            return;
        }

        let delta = self.input.look(ctx).x * self.settings.rotation_speed_multiplier;
        if delta != 0.0 {
            self.yaw = self.settings.yaw_policy().apply(self.yaw + delta);
            debug!(delta, yaw = self.yaw, "fixed_view_rotated");
        }
        self.sync_viewpoint();
    }

    /// Hide is applied to the actor directly; other actions are handed back.
    pub fn press_action<B: CharacterBody>(
        &self,
        action: &ActionKind,
        actor: &mut Actor<B>,
    ) -> Option<PlayerSignal> {
        info!(action = ?action, "action_button_pressed");
        match action {
            ActionKind::Hide => {
                actor.hide();
                None
            }
            ActionKind::OpenCamera => Some(PlayerSignal::OpenCamera),
            ActionKind::Custom(name) => Some(PlayerSignal::Action(name.clone())),
        }
    }

    pub fn set_rotation_limit(&mut self, enabled: bool) {
        self.settings.limit_rotation = enabled;
        self.yaw = self.settings.yaw_policy().apply(self.yaw);
        self.sync_viewpoint();
    }

    pub fn set_rotation_speed_multiplier(&mut self, multiplier: f32) {
        self.settings.rotation_speed_multiplier = clamp_with_warning(
            "fixed_view.rotation_speed_multiplier",
            multiplier,
            MIN_SPEED_MULTIPLIER,
            MAX_SPEED_MULTIPLIER,
        );
    }

    pub fn reset_rotation(&mut self) {
        self.yaw = 0.0;
        self.sync_viewpoint();
    }

    pub fn current_yaw(&self) -> f32 {
        self.yaw
    }

    pub fn set_left_rotation_button(&mut self, button: Option<RotationButtonHandle>) {
        self.input.set_left_button(button);
    }

    pub fn set_right_rotation_button(&mut self, button: Option<RotationButtonHandle>) {
        self.input.set_right_button(button);
    }

    pub fn settings(&self) -> &FixedViewSettings {
        &self.settings
    }

    pub fn viewpoint(&self) -> Option<&Viewpoint> {
        self.viewpoint.as_ref()
    }

    fn sync_viewpoint(&mut self) {
        let yaw = self.base.yaw + self.yaw;
        let yaw = if self.settings.limit_rotation {
            yaw
        } else {
            wrap_degrees(yaw)
        };
        if let Some(viewpoint) = self.viewpoint.as_mut() {
            viewpoint.orientation = LookOrientation::new(yaw, self.base.pitch);
        }
    }
}
