mod input;
mod loop_runner;
mod scene;
mod touch;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, CursorMode, LoopConfig};
pub use scene::{FrameContext, InputSnapshot, Scene, SceneCommand, SceneKey};
pub use touch::{ScreenRect, TouchPhase, TouchPoint};
