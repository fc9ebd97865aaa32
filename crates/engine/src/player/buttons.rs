use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use super::source::InputSource;
use super::validate::positive_or_default;
use crate::app::FrameContext;

pub const DEFAULT_ROTATION_SPEED: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    Left,
    Right,
}

impl RotationDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// On-screen rotate button. The UI layer presses and releases it; the input
/// source reads its contribution every tick.
#[derive(Debug, Clone)]
pub struct RotationButton {
    direction: RotationDirection,
    speed: f32,
    pressed: bool,
}

/// Shared between the UI layer and the input source on the frame thread.
pub type RotationButtonHandle = Rc<RefCell<RotationButton>>;

impl RotationButton {
    /// `speed` is degrees per second.
    pub fn new(direction: RotationDirection, speed: f32) -> Self {
        Self {
            direction,
            speed: positive_or_default("rotation_button.speed", speed, DEFAULT_ROTATION_SPEED),
            pressed: false,
        }
    }

    pub fn into_handle(self) -> RotationButtonHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn direction(&self) -> RotationDirection {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn press(&mut self) {
        self.pressed = true;
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }

    /// Signed degrees per second while held, zero otherwise.
    pub fn rotation_speed(&self) -> f32 {
        if self.pressed {
            self.direction.sign() * self.speed
        } else {
            0.0
        }
    }
}

/// Look-only backend fed by a left/right pair of rotation buttons.
#[derive(Debug, Clone, Default)]
pub struct ButtonPairInput {
    left: Option<RotationButtonHandle>,
    right: Option<RotationButtonHandle>,
}

impl ButtonPairInput {
    pub fn new(left: RotationButtonHandle, right: RotationButtonHandle) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    pub fn set_left_button(&mut self, button: Option<RotationButtonHandle>) {
        self.left = button;
    }

    pub fn set_right_button(&mut self, button: Option<RotationButtonHandle>) {
        self.right = button;
    }

    pub fn left_button(&self) -> Option<&RotationButtonHandle> {
        self.left.as_ref()
    }

    pub fn right_button(&self) -> Option<&RotationButtonHandle> {
        self.right.as_ref()
    }

    fn rotation_speed(&self) -> f32 {
        [self.left.as_ref(), self.right.as_ref()]
            .into_iter()
            .flatten()
            .map(|button| button.borrow().rotation_speed())
            .sum()
    }
}

impl InputSource for ButtonPairInput {
    fn movement(&self, _ctx: &FrameContext<'_>) -> Vec2 {
        Vec2::ZERO
    }

    fn look(&mut self, ctx: &FrameContext<'_>) -> Vec2 {
        Vec2::new(self.rotation_speed() * ctx.dt_seconds, 0.0)
    }

    fn interact(&self, _ctx: &FrameContext<'_>) -> bool {
        false
    }

    fn pause(&self, _ctx: &FrameContext<'_>) -> bool {
        false
    }

    fn crouch(&self, _ctx: &FrameContext<'_>) -> bool {
        false
    }
}
