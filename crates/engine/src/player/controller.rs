use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::actor::{Actor, CharacterBody, CrouchSettings};
use super::camera::{LookOrientation, PitchRange, Viewpoint, YawPolicy};
use super::pointer::DEFAULT_POINTER_SENSITIVITY;
use super::source::{InputBackend, InputMode, InputSource};
use super::touch_input::{TouchInput, DEFAULT_TOUCH_SENSITIVITY};
use super::validate::{positive_or_default, WarnOnce};
use crate::app::{CursorMode, FrameContext};

pub const DEFAULT_WALK_SPEED: f32 = 5.0;
pub const DEFAULT_GRAVITY: f32 = -9.81;
pub const DEFAULT_EYE_HEIGHT: f32 = 1.6;
/// Vertical speed held while grounded so the body keeps touching the floor.
pub const GROUNDED_VERTICAL_SPEED: f32 = -2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub walk_speed: f32,
    pub gravity: f32,
    pub pointer_sensitivity: f32,
    pub touch_sensitivity: f32,
    pub pitch: PitchRange,
    pub eye_height: f32,
    pub yaw_policy: YawPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            walk_speed: DEFAULT_WALK_SPEED,
            gravity: DEFAULT_GRAVITY,
            pointer_sensitivity: DEFAULT_POINTER_SENSITIVITY,
            touch_sensitivity: DEFAULT_TOUCH_SENSITIVITY,
            pitch: PitchRange::default(),
            eye_height: DEFAULT_EYE_HEIGHT,
            yaw_policy: YawPolicy::Wrapped,
        }
    }
}

impl ControllerSettings {
    pub(crate) fn validated(self) -> Self {
        Self {
            walk_speed: positive_or_default("walk_speed", self.walk_speed, DEFAULT_WALK_SPEED),
            gravity: if self.gravity.is_finite() {
                self.gravity
            } else {
                warn!(
                    value = self.gravity,
                    default = DEFAULT_GRAVITY,
                    "gravity must be finite; reset to default"
                );
                DEFAULT_GRAVITY
            },
            pointer_sensitivity: positive_or_default(
                "pointer_sensitivity",
                self.pointer_sensitivity,
                DEFAULT_POINTER_SENSITIVITY,
            ),
            touch_sensitivity: positive_or_default(
                "touch_sensitivity",
                self.touch_sensitivity,
                DEFAULT_TOUCH_SENSITIVITY,
            ),
            pitch: self.pitch.validated(),
            eye_height: positive_or_default("eye_height", self.eye_height, DEFAULT_EYE_HEIGHT),
            yaw_policy: self.yaw_policy.validated(),
        }
    }
}

/// Notifications a controller hands to its owner; the owner decides the effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSignal {
    Pause,
    Interact,
    OpenCamera,
    Action(String),
}

/// First-person controller: one input backend driving an [`Actor`] and a
/// free-look viewpoint.
pub struct PlayerController<B> {
    settings: ControllerSettings,
    mode: InputMode,
    input: InputBackend,
    actor: Actor<B>,
    orientation: LookOrientation,
    viewpoint: Option<Viewpoint>,
    vertical_velocity: f32,
    pause_held: bool,
    missing_viewpoint: WarnOnce,
}

impl<B: CharacterBody> PlayerController<B> {
    pub fn new(
        body: B,
        settings: ControllerSettings,
        crouch: CrouchSettings,
        mode: InputMode,
    ) -> Self {
        let settings = settings.validated();
        let input = InputBackend::for_mode(
            mode,
            settings.pointer_sensitivity,
            settings.touch_sensitivity,
        );
        info!(input = input.kind(), "player_controller_activated");
        Self {
            settings,
            mode,
            input,
            actor: Actor::new(body, crouch),
            orientation: LookOrientation::default(),
            viewpoint: None,
            vertical_velocity: 0.0,
            pause_held: false,
            missing_viewpoint: WarnOnce::default(),
        }
    }

    /// Creates the viewpoint at eye height above the body.
    pub fn attach_viewpoint(&mut self) {
        self.viewpoint = Some(self.eye_viewpoint());
        self.missing_viewpoint.reset();
    }

    pub fn detach_viewpoint(&mut self) {
        self.viewpoint = None;
    }

    /// Runs one tick and returns the notifications raised during it, in order.
    pub fn update(&mut self, ctx: &FrameContext<'_>) -> Vec<PlayerSignal> {
        let mut signals = Vec::new();

        // A held pause gesture raises one notification.
        let pause = self.input.pause(ctx);
        if pause && !self.pause_held {
            info!("pause_requested");
            signals.push(PlayerSignal::Pause);
        }
        self.pause_held = pause;

        if self.actor.can_move() && self.viewpoint.is_some() {
            self.apply_movement(ctx);
            self.apply_look(ctx);
            self.viewpoint = Some(self.eye_viewpoint());
        } else {
            if self.actor.can_move() && self.missing_viewpoint.should_warn() {
                warn!("player controller has no viewpoint; movement skipped until one is attached");
            }
            self.input.track_look(ctx);
        }

        if self.input.crouch(ctx) {
            self.actor.toggle_crouch();
        }

        if self.input.interact(ctx) {
            info!("interact_requested");
            signals.push(PlayerSignal::Interact);
        }

        signals
    }

    /// Entry point for the on-screen crouch button.
    pub fn on_crouch_button(&mut self) {
        self.actor.toggle_crouch();
        if self.viewpoint.is_some() {
            self.viewpoint = Some(self.eye_viewpoint());
        }
    }

    /// Places the body and faces the given direction; used when a scene spawns the player.
    pub fn teleport(&mut self, position: Vec3, orientation: LookOrientation) {
        self.actor.move_to(position);
        self.orientation = LookOrientation::new(
            self.settings.yaw_policy.apply(orientation.yaw),
            self.settings.pitch.apply(orientation.pitch),
        );
        self.vertical_velocity = 0.0;
        if self.viewpoint.is_some() {
            self.viewpoint = Some(self.eye_viewpoint());
        }
    }

    pub fn cursor_mode(&self) -> CursorMode {
        match self.mode {
            InputMode::Pointer => CursorMode::Locked,
            InputMode::Touch => CursorMode::Free,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        self.mode
    }

    /// Joystick and dead-zone wiring for the touch backend; `None` otherwise.
    pub fn touch_input_mut(&mut self) -> Option<&mut TouchInput> {
        self.input.as_touch_mut()
    }

    pub fn actor(&self) -> &Actor<B> {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut Actor<B> {
        &mut self.actor
    }

    pub fn viewpoint(&self) -> Option<&Viewpoint> {
        self.viewpoint.as_ref()
    }

    pub fn orientation(&self) -> LookOrientation {
        self.orientation
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    fn apply_movement(&mut self, ctx: &FrameContext<'_>) {
        let Some(viewpoint) = self.viewpoint else {
            return;
        };
        let input: Vec2 = self.input.movement(ctx);
        let (forward, right) = viewpoint.horizontal_basis();
        let horizontal = (forward * input.y + right * input.x) * self.settings.walk_speed;

        self.vertical_velocity = if self.actor.body().is_grounded() {
            GROUNDED_VERTICAL_SPEED
        } else {
            self.vertical_velocity + self.settings.gravity * ctx.dt_seconds
        };

        let displacement = (horizontal + Vec3::Y * self.vertical_velocity) * ctx.dt_seconds;
        self.actor.body_mut().move_by(displacement);
    }

    fn apply_look(&mut self, ctx: &FrameContext<'_>) {
        let look = self.input.look(ctx);
        self.orientation.yaw = self.settings.yaw_policy.apply(self.orientation.yaw + look.x);
        self.orientation.pitch = self.settings.pitch.apply(self.orientation.pitch - look.y);
    }

    /// Eye height follows the capsule so crouching lowers the view.
    fn eye_viewpoint(&self) -> Viewpoint {
        let standing = self.actor.standing_capsule().height;
        let scale = if standing > 0.0 {
            self.actor.capsule().height / standing
        } else {
            1.0
        };
        let eye = self.actor.body().position() + Vec3::Y * self.settings.eye_height * scale;
        Viewpoint::new(eye, self.orientation)
    }
}
