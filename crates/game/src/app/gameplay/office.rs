use std::rc::Rc;

use engine::{
    ActionKind, Actor, ActorState, ButtonPairInput, FixedViewController, FrameContext,
    GazeDetector, InputAction, LookOrientation, PlayerSignal, RotationButton,
    RotationButtonHandle, RotationDirection, Scene, SceneCommand, SceneKey, Viewpoint,
};
use glam::Vec3;
use tracing::info;

use super::night::PLAYER_HEIGHT;
use super::props::PropKind;
use super::stage::{Aabb, KinematicBody, StageWorld};
use crate::app::progress::SharedProgress;
use crate::app::settings::GameSettings;

pub(crate) const OFFICE_EYE: Vec3 = Vec3::new(0.0, 1.2, 0.0);
const ROTATION_SPEED_DEGREES_PER_SECOND: f32 = 60.0;

pub(crate) fn office_room() -> Aabb {
    Aabb {
        min: Vec3::new(-3.0, 0.0, -3.0),
        max: Vec3::new(3.0, 3.0, 3.0),
    }
}

fn build_office_stage() -> StageWorld {
    let mut world = StageWorld::default();
    world.add_prop(
        PropKind::Monitor,
        Aabb::from_center(Vec3::new(0.0, 1.2, 1.5), Vec3::new(0.5, 0.35, 0.1)),
    );
    world.add_prop(
        PropKind::OfficeDoor,
        Aabb::from_center(Vec3::new(2.9, 1.0, 0.0), Vec3::new(0.1, 1.0, 0.6)),
    );
    world.add_wall(Aabb {
        min: Vec3::new(-3.2, 0.0, -3.0),
        max: Vec3::new(-3.0, 3.0, 3.0),
    });
    world
}

/// Seated security office: the camera only turns, through two rotation buttons.
pub(crate) struct OfficeScene {
    settings: GameSettings,
    progress: SharedProgress,
    world: StageWorld,
    actor: Option<Actor<KinematicBody>>,
    view: Option<FixedViewController>,
    left: RotationButtonHandle,
    right: RotationButtonHandle,
    gaze: GazeDetector,
    camera_open: bool,
}

impl OfficeScene {
    pub(crate) fn new(settings: GameSettings, progress: SharedProgress) -> Self {
        let gaze = GazeDetector::new(settings.gaze.clone());
        Self {
            settings,
            progress,
            world: StageWorld::default(),
            actor: None,
            view: None,
            left: RotationButton::new(RotationDirection::Left, ROTATION_SPEED_DEGREES_PER_SECOND)
                .into_handle(),
            right: RotationButton::new(
                RotationDirection::Right,
                ROTATION_SPEED_DEGREES_PER_SECOND,
            )
            .into_handle(),
            gaze,
            camera_open: false,
        }
    }

    /// Handles for the on-screen arrows; the UI layer presses and releases them.
    #[cfg(test)]
    pub(crate) fn rotation_buttons(&self) -> (RotationButtonHandle, RotationButtonHandle) {
        (Rc::clone(&self.left), Rc::clone(&self.right))
    }

    #[cfg(test)]
    pub(crate) fn view(&self) -> Option<&FixedViewController> {
        self.view.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn actor(&self) -> Option<&Actor<KinematicBody>> {
        self.actor.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn gaze(&self) -> &GazeDetector {
        &self.gaze
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> &StageWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn is_camera_open(&self) -> bool {
        self.camera_open
    }

    fn press_action(&mut self, action: ActionKind) {
        let (Some(view), Some(actor)) = (self.view.as_ref(), self.actor.as_mut()) else {
            return;
        };
        if action == ActionKind::Hide && actor.state() == ActorState::Hiding {
            actor.walk();
            return;
        }
        if let Some(PlayerSignal::OpenCamera) = view.press_action(&action, actor) {
            self.camera_open = !self.camera_open;
            if self.camera_open {
                actor.interact_with_ui();
            } else {
                actor.walk();
            }
            info!(open = self.camera_open, "security_camera_toggled");
        }
    }
}

impl Scene for OfficeScene {
    fn load(&mut self) {
        self.world = build_office_stage();
        self.camera_open = false;
        self.left.borrow_mut().release();
        self.right.borrow_mut().release();

        let body = KinematicBody::new(Vec3::ZERO, PLAYER_HEIGHT, office_room());
        self.actor = Some(Actor::new(body, self.settings.crouch));

        let mut view = FixedViewController::new(
            self.settings.fixed_view.clone(),
            ButtonPairInput::new(Rc::clone(&self.left), Rc::clone(&self.right)),
        );
        view.attach_viewpoint(Viewpoint::new(OFFICE_EYE, LookOrientation::default()));
        self.view = Some(view);

        info!(
            night = self.progress.borrow().progress().current_night,
            "office_started"
        );
    }

    fn update(&mut self, ctx: &FrameContext<'_>) -> SceneCommand {
        if ctx.input.was_pressed(InputAction::SwitchScene) {
            return SceneCommand::SwitchTo(SceneKey::Night);
        }

        self.left
            .borrow_mut()
            .set_pressed(ctx.input.is_down(InputAction::RotateLeft));
        self.right
            .borrow_mut()
            .set_pressed(ctx.input.is_down(InputAction::RotateRight));

        if let Some(view) = self.view.as_mut() {
            view.update(ctx);
        }

        if ctx.input.was_pressed(InputAction::Hide) {
            self.press_action(ActionKind::Hide);
        }
        if ctx.input.was_pressed(InputAction::OpenCamera) {
            self.press_action(ActionKind::OpenCamera);
        }

        let viewpoint = self.view.as_ref().and_then(FixedViewController::viewpoint);
        self.gaze.update(viewpoint, &mut self.world);
        SceneCommand::None
    }

    fn unload(&mut self) {
        self.gaze.clear(&mut self.world);
        self.view = None;
        self.actor = None;
        self.left.borrow_mut().release();
        self.right.borrow_mut().release();
        info!("office_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        let view = self.view.as_ref()?;
        let state = self.actor.as_ref().map(Actor::state).unwrap_or_default();
        Some(format!(
            "Office | night {} | yaw {:.0} | {:?}{} | looking at: {}",
            self.progress.borrow().progress().current_night,
            view.current_yaw(),
            state,
            if self.camera_open { " | camera" } else { "" },
            self.gaze.current_target_name().unwrap_or("-"),
        ))
    }
}
