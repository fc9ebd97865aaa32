use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::buttons::ButtonPairInput;
use super::pointer::PointerInput;
use super::touch_input::TouchInput;
use crate::app::FrameContext;

/// Capability every input backend provides. Queried once per tick.
///
/// Interact and crouch are edge-triggered. Pause may stay `true` while a gesture
/// is held; owners react to its rising edge.
pub trait InputSource {
    /// Each component in [-1, 1], magnitude at most 1.
    fn movement(&self, ctx: &FrameContext<'_>) -> Vec2;
    /// Degrees-equivalent for this tick. Positive x turns right, positive y looks up.
    fn look(&mut self, ctx: &FrameContext<'_>) -> Vec2;
    fn interact(&self, ctx: &FrameContext<'_>) -> bool;
    fn pause(&self, ctx: &FrameContext<'_>) -> bool;
    fn crouch(&self, ctx: &FrameContext<'_>) -> bool;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Pointer,
    Touch,
}

/// Closed set of backends, chosen once when the owner activates.
pub enum InputBackend {
    Pointer(PointerInput),
    Buttons(ButtonPairInput),
    Touch(TouchInput),
}

impl InputBackend {
    pub fn for_mode(mode: InputMode, pointer_sensitivity: f32, touch_sensitivity: f32) -> Self {
        match mode {
            InputMode::Pointer => Self::Pointer(PointerInput::new(pointer_sensitivity)),
            InputMode::Touch => Self::Touch(TouchInput::new(touch_sensitivity)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pointer(_) => "pointer",
            Self::Buttons(_) => "buttons",
            Self::Touch(_) => "touch",
        }
    }

    pub fn as_touch_mut(&mut self) -> Option<&mut TouchInput> {
        match self {
            Self::Touch(touch) => Some(touch),
            _ => None,
        }
    }

    /// Keeps per-tick look state current on ticks whose look delta is ignored.
    pub fn track_look(&mut self, ctx: &FrameContext<'_>) {
        if let Self::Touch(touch) = self {
            touch.track(ctx);
        }
    }

    pub fn as_buttons_mut(&mut self) -> Option<&mut ButtonPairInput> {
        match self {
            Self::Buttons(buttons) => Some(buttons),
            _ => None,
        }
    }
}

impl InputSource for InputBackend {
    fn movement(&self, ctx: &FrameContext<'_>) -> Vec2 {
        match self {
            Self::Pointer(source) => source.movement(ctx),
            Self::Buttons(source) => source.movement(ctx),
            Self::Touch(source) => source.movement(ctx),
        }
    }

    fn look(&mut self, ctx: &FrameContext<'_>) -> Vec2 {
        match self {
            Self::Pointer(source) => source.look(ctx),
            Self::Buttons(source) => source.look(ctx),
            Self::Touch(source) => source.look(ctx),
        }
    }

    fn interact(&self, ctx: &FrameContext<'_>) -> bool {
        match self {
            Self::Pointer(source) => source.interact(ctx),
            Self::Buttons(source) => source.interact(ctx),
            Self::Touch(source) => source.interact(ctx),
        }
    }

    fn pause(&self, ctx: &FrameContext<'_>) -> bool {
        match self {
            Self::Pointer(source) => source.pause(ctx),
            Self::Buttons(source) => source.pause(ctx),
            Self::Touch(source) => source.pause(ctx),
        }
    }

    fn crouch(&self, ctx: &FrameContext<'_>) -> bool {
        match self {
            Self::Pointer(source) => source.crouch(ctx),
            Self::Buttons(source) => source.crouch(ctx),
            Self::Touch(source) => source.crouch(ctx),
        }
    }
}
