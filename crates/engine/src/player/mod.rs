//! Gaze-directed interaction and multi-modal player input.
//!
//! Leaf first: input backends ([`InputSource`]), the actor state machine
//! ([`Actor`]), the gaze detector ([`GazeDetector`]) and the two controllers that
//! compose them once per tick ([`PlayerController`], [`FixedViewController`]).

mod actor;
mod buttons;
mod camera;
mod controller;
mod fixed_view;
mod gaze;
mod pointer;
mod source;
mod touch_input;
mod validate;

pub use actor::{Actor, ActorState, CapsuleShape, CharacterBody, CrouchSettings};
pub use buttons::{ButtonPairInput, RotationButton, RotationButtonHandle, RotationDirection};
pub use camera::{wrap_degrees, LookOrientation, PitchRange, Viewpoint, YawPolicy};
pub use controller::{ControllerSettings, PlayerController, PlayerSignal};
pub use fixed_view::{ActionKind, FixedViewController, FixedViewSettings};
pub use gaze::{
    GazeDetector, GazeEvent, GazeSettings, GazeWorld, LayerMask, LookTarget, ObjectId, Ray,
    RayHit,
};
pub use pointer::PointerInput;
pub use source::{InputBackend, InputMode, InputSource};
pub use touch_input::{
    CameraDeadZone, CrouchButton, DeadZone, Joystick, JoystickSettings, TouchInput,
    VirtualJoystick,
};
