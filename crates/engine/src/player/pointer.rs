use glam::Vec2;

use super::source::InputSource;
use super::validate::positive_or_default;
use crate::app::{FrameContext, InputAction};

pub const DEFAULT_POINTER_SENSITIVITY: f32 = 2.0;

/// Keyboard and mouse.
#[derive(Debug, Clone)]
pub struct PointerInput {
    sensitivity: f32,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self::new(DEFAULT_POINTER_SENSITIVITY)
    }
}

impl PointerInput {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity: positive_or_default(
                "pointer_sensitivity",
                sensitivity,
                DEFAULT_POINTER_SENSITIVITY,
            ),
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }
}

fn axis(ctx: &FrameContext<'_>, negative: InputAction, positive: InputAction) -> f32 {
    let mut value = 0.0;
    if ctx.input.is_down(negative) {
        value -= 1.0;
    }
    if ctx.input.is_down(positive) {
        value += 1.0;
    }
    value
}

impl InputSource for PointerInput {
    fn movement(&self, ctx: &FrameContext<'_>) -> Vec2 {
        let raw = Vec2::new(
            axis(ctx, InputAction::MoveLeft, InputAction::MoveRight),
            axis(ctx, InputAction::MoveBack, InputAction::MoveForward),
        );
        if raw.length_squared() > 1.0 {
            raw.normalize()
        } else {
            raw
        }
    }

    fn look(&mut self, ctx: &FrameContext<'_>) -> Vec2 {
        ctx.input.pointer_delta() * self.sensitivity
    }

    fn interact(&self, ctx: &FrameContext<'_>) -> bool {
        ctx.input.was_pressed(InputAction::Interact) || ctx.input.primary_click_pressed()
    }

    fn pause(&self, ctx: &FrameContext<'_>) -> bool {
        ctx.input.was_pressed(InputAction::Pause)
    }

    fn crouch(&self, ctx: &FrameContext<'_>) -> bool {
        ctx.input.was_pressed(InputAction::Crouch)
    }
}
