use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CROUCH_MULTIPLIER: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActorState {
    #[default]
    Walking,
    Hiding,
    InteractingUI,
}

/// Upright capsule. `center` is relative to the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleShape {
    pub height: f32,
    pub center: Vec3,
}

impl CapsuleShape {
    pub fn new(height: f32, center: Vec3) -> Self {
        Self { height, center }
    }

    /// Local y of the capsule's lowest point.
    pub fn bottom(&self) -> f32 {
        self.center.y - self.height * 0.5
    }
}

/// Character mover the actor and controllers drive.
pub trait CharacterBody {
    fn position(&self) -> Vec3;
    /// Applies a world-space displacement, resolving contacts as the body sees fit.
    fn move_by(&mut self, displacement: Vec3);
    fn is_grounded(&self) -> bool;
    fn capsule(&self) -> CapsuleShape;
    fn set_capsule(&mut self, capsule: CapsuleShape);
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrouchSettings {
    pub height_multiplier: f32,
}

impl Default for CrouchSettings {
    fn default() -> Self {
        Self {
            height_multiplier: DEFAULT_CROUCH_MULTIPLIER,
        }
    }
}

impl CrouchSettings {
    pub(crate) fn validated(self) -> Self {
        let multiplier = self.height_multiplier;
        if multiplier > 0.0 && multiplier < 1.0 {
            return self;
        }
        warn!(
            value = multiplier,
            default = DEFAULT_CROUCH_MULTIPLIER,
            "crouch height multiplier must lie strictly between 0 and 1; reset to default"
        );
        Self::default()
    }
}

/// Locomotion state plus a crouch sub-state that reshapes the body capsule.
#[derive(Debug)]
pub struct Actor<B> {
    body: B,
    state: ActorState,
    is_crouched: bool,
    has_item: bool,
    standing: CapsuleShape,
    settings: CrouchSettings,
}

impl<B: CharacterBody> Actor<B> {
    /// Captures the body's current capsule as the standing shape.
    pub fn new(body: B, settings: CrouchSettings) -> Self {
        let standing = body.capsule();
        Self {
            body,
            state: ActorState::Walking,
            is_crouched: false,
            has_item: false,
            standing,
            settings: settings.validated(),
        }
    }

    pub fn state(&self) -> ActorState {
        self.state
    }

    pub fn can_move(&self) -> bool {
        self.state == ActorState::Walking
    }

    pub fn hide(&mut self) {
        self.set_state(ActorState::Hiding);
    }

    pub fn walk(&mut self) {
        self.set_state(ActorState::Walking);
    }

    pub fn interact_with_ui(&mut self) {
        self.set_state(ActorState::InteractingUI);
    }

    pub fn is_crouched(&self) -> bool {
        self.is_crouched
    }

    /// No-op when already crouched.
    pub fn crouch(&mut self) {
        if self.is_crouched {
            return;
        }
        let height = self.standing.height * self.settings.height_multiplier;
        let mut center = self.standing.center;
        center.y -= (self.standing.height - height) * 0.5;
        self.body.set_capsule(CapsuleShape::new(height, center));
        self.is_crouched = true;
        info!(height, "actor_crouched");
    }

    /// No-op when already standing.
    pub fn stand_up(&mut self) {
        if !self.is_crouched {
            return;
        }
        self.body.set_capsule(self.standing);
        self.is_crouched = false;
        info!(height = self.standing.height, "actor_stood_up");
    }

    pub fn toggle_crouch(&mut self) {
        if self.is_crouched {
            self.stand_up();
        } else {
            self.crouch();
        }
    }

    pub fn has_item(&self) -> bool {
        self.has_item
    }

    pub fn set_has_item(&mut self, has_item: bool) {
        if self.has_item != has_item {
            info!(has_item, "actor_item_changed");
        }
        self.has_item = has_item;
    }

    /// Displaces the body so that it ends up at `position`.
    pub fn move_to(&mut self, position: Vec3) {
        let displacement = position - self.body.position();
        self.body.move_by(displacement);
    }

    pub fn capsule(&self) -> CapsuleShape {
        self.body.capsule()
    }

    pub fn standing_capsule(&self) -> CapsuleShape {
        self.standing
    }

    pub fn crouch_settings(&self) -> CrouchSettings {
        self.settings
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    fn set_state(&mut self, next: ActorState) {
        if self.state == next {
            return;
        }
        let previous = self.state;
        self.state = next;
        info!(from = ?previous, to = ?next, "actor_state_changed");
    }
}
