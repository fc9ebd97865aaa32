use std::cell::RefCell;
use std::rc::Rc;

use engine::{
    ActorState, CameraDeadZone, CrouchButton, FrameContext, GazeDetector, GazeEvent, InputAction,
    LookOrientation, PlayerController, PlayerSignal, Scene, SceneCommand, SceneKey, ScreenRect,
    VirtualJoystick,
};
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use super::props::PropKind;
use super::stage::{Aabb, KinematicBody, StageWorld};
use crate::app::progress::SharedProgress;
use crate::app::settings::{GameSettings, RectSetting};

pub(crate) const PLAYER_HEIGHT: f32 = 1.8;
pub(crate) const NIGHT_SPAWN: Vec3 = Vec3::new(0.0, 0.0, -3.0);

pub(crate) fn night_room() -> Aabb {
    Aabb {
        min: Vec3::new(-5.0, 0.0, -5.0),
        max: Vec3::new(5.0, 3.0, 5.0),
    }
}

fn build_night_stage() -> StageWorld {
    let mut world = StageWorld::default();
    let room = night_room();
    let thickness = 0.2;
    world.add_wall(Aabb {
        min: Vec3::new(room.min.x, room.min.y, room.max.z),
        max: Vec3::new(room.max.x, room.max.y, room.max.z + thickness),
    });
    world.add_wall(Aabb {
        min: Vec3::new(room.min.x, room.min.y, room.min.z - thickness),
        max: Vec3::new(room.max.x, room.max.y, room.min.z),
    });
    world.add_wall(Aabb {
        min: Vec3::new(room.max.x, room.min.y, room.min.z),
        max: Vec3::new(room.max.x + thickness, room.max.y, room.max.z),
    });
    world.add_wall(Aabb {
        min: Vec3::new(room.min.x - thickness, room.min.y, room.min.z),
        max: Vec3::new(room.min.x, room.max.y, room.max.z),
    });

    world.add_prop(
        PropKind::FlashDrive,
        Aabb::from_center(Vec3::new(0.0, 1.5, 2.0), Vec3::splat(0.15)),
    );
    world.add_prop(
        PropKind::Locker,
        Aabb::from_center(Vec3::new(4.4, 1.0, 0.0), Vec3::new(0.5, 1.0, 0.5)),
    );
    world.add_prop(
        PropKind::ExitDoor,
        Aabb::from_center(Vec3::new(0.0, 1.0, 4.9), Vec3::new(0.6, 1.0, 0.1)),
    );
    world.add_prop(
        PropKind::Poster,
        Aabb::from_center(Vec3::new(-4.95, 1.6, 0.0), Vec3::new(0.05, 0.4, 0.3)),
    );
    world
}

fn screen_rect(rect: RectSetting) -> ScreenRect {
    ScreenRect::new(Vec2::from(rect.min), Vec2::from(rect.size))
}

/// Touch widgets owned by the scene; the controller's touch backend reads them.
struct TouchWidgets {
    joystick: Rc<RefCell<VirtualJoystick>>,
    crouch_button: CrouchButton,
}

/// First-person level: find the flash drive, avoid being seen, leave through the exit.
pub(crate) struct NightScene {
    settings: GameSettings,
    progress: SharedProgress,
    world: StageWorld,
    controller: Option<PlayerController<KinematicBody>>,
    gaze: GazeDetector,
    touch: Option<TouchWidgets>,
    paused: Option<ActorState>,
}

impl NightScene {
    pub(crate) fn new(settings: GameSettings, progress: SharedProgress) -> Self {
        let gaze = GazeDetector::new(settings.gaze.clone());
        Self {
            settings,
            progress,
            world: StageWorld::default(),
            controller: None,
            gaze,
            touch: None,
            paused: None,
        }
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.is_some()
    }

    #[cfg(test)]
    pub(crate) fn controller(&self) -> Option<&PlayerController<KinematicBody>> {
        self.controller.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn controller_mut(&mut self) -> Option<&mut PlayerController<KinematicBody>> {
        self.controller.as_mut()
    }

    #[cfg(test)]
    pub(crate) fn world(&self) -> &StageWorld {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn gaze(&self) -> &GazeDetector {
        &self.gaze
    }

    fn wire_touch_widgets(&mut self, controller: &mut PlayerController<KinematicBody>) {
        let layout = &self.settings.touch_layout;
        let Some(touch_input) = controller.touch_input_mut() else {
            return;
        };

        let joystick = VirtualJoystick::new(
            Vec2::from(layout.joystick_center),
            layout.joystick_radius,
            self.settings.joystick,
        )
        .into_handle();
        let crouch_button = CrouchButton::new(screen_rect(layout.crouch_button));

        touch_input.set_joystick(Some(Box::new(Rc::clone(&joystick))));
        touch_input.clear_dead_zones();
        touch_input.add_dead_zone(Box::new(crouch_button));
        if let Some(rect) = layout.camera_dead_zone {
            touch_input.add_dead_zone(Box::new(CameraDeadZone::new(screen_rect(rect))));
        }

        self.touch = Some(TouchWidgets {
            joystick,
            crouch_button,
        });
        info!("touch_widgets_ready");
    }

    fn toggle_pause(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let actor = controller.actor_mut();
        match self.paused.take() {
            Some(resume) => {
                match resume {
                    ActorState::Walking => actor.walk(),
                    ActorState::Hiding => actor.hide(),
                    ActorState::InteractingUI => actor.interact_with_ui(),
                }
                info!("night_resumed");
            }
            None => {
                self.paused = Some(actor.state());
                actor.interact_with_ui();
                info!("night_paused");
            }
        }
    }

    fn interact(&mut self) -> SceneCommand {
        let Some(controller) = self.controller.as_mut() else {
            return SceneCommand::None;
        };
        let actor = controller.actor_mut();
        if actor.state() == ActorState::Hiding {
            actor.walk();
            info!("left_hiding_spot");
            return SceneCommand::None;
        }

        let Some(target) = self.gaze.current_target() else {
            return SceneCommand::None;
        };
        let Some(kind) = self.world.prop(target).map(|prop| prop.kind()) else {
            return SceneCommand::None;
        };

        match kind {
            PropKind::FlashDrive => {
                actor.set_has_item(true);
                self.world.remove(target);
                info!("flash_drive_collected");
                SceneCommand::None
            }
            PropKind::Locker => {
                actor.hide();
                SceneCommand::None
            }
            PropKind::ExitDoor if actor.has_item() => self.complete_night(),
            PropKind::ExitDoor => {
                info!("exit_locked_without_flash_drive");
                SceneCommand::None
            }
            other => {
                debug!(prop = other.name(), "nothing_to_interact_with");
                SceneCommand::None
            }
        }
    }

    fn complete_night(&mut self) -> SceneCommand {
        self.progress.borrow_mut().complete_night();
        SceneCommand::SwitchTo(SceneKey::Office)
    }

    fn fail_night(&mut self) -> SceneCommand {
        self.progress.borrow_mut().record_death();
        SceneCommand::Reload
    }
}

impl Scene for NightScene {
    fn load(&mut self) {
        self.world = build_night_stage();
        self.paused = None;
        self.touch = None;

        let body = KinematicBody::new(NIGHT_SPAWN, PLAYER_HEIGHT, night_room());
        let mut controller = PlayerController::new(
            body,
            self.settings.controller.clone(),
            self.settings.crouch,
            self.settings.input_mode,
        );
        controller.teleport(NIGHT_SPAWN, LookOrientation::default());
        controller.attach_viewpoint();
        self.wire_touch_widgets(&mut controller);
        self.controller = Some(controller);

        info!(
            night = self.progress.borrow().progress().current_night,
            "night_started"
        );
    }

    fn update(&mut self, ctx: &FrameContext<'_>) -> SceneCommand {
        if ctx.input.was_pressed(InputAction::DebugCompleteNight) {
            return self.complete_night();
        }
        if ctx.input.was_pressed(InputAction::DebugFailNight) {
            return self.fail_night();
        }

        let Some(controller) = self.controller.as_mut() else {
            return SceneCommand::None;
        };

        if let Some(touch) = &self.touch {
            touch.joystick.borrow_mut().track(ctx.input.touches());
            if self.paused.is_none() && touch.crouch_button.was_tapped(ctx.input.touches()) {
                controller.on_crouch_button();
            }
        }

        let signals = controller.update(ctx);
        if let GazeEvent::Entered { current, .. } =
            self.gaze.update(controller.viewpoint(), &mut self.world)
        {
            debug!(object = current.0, "night_gaze_target");
        }

        for signal in signals {
            let command = match signal {
                PlayerSignal::Pause => {
                    self.toggle_pause();
                    SceneCommand::None
                }
                PlayerSignal::Interact if self.paused.is_none() => self.interact(),
                _ => SceneCommand::None,
            };
            if command != SceneCommand::None {
                return command;
            }
        }
        SceneCommand::None
    }

    fn unload(&mut self) {
        self.gaze.clear(&mut self.world);
        self.controller = None;
        self.touch = None;
        self.paused = None;
        info!("night_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        let controller = self.controller.as_ref()?;
        let actor = controller.actor();
        let looking_at = self.gaze.current_target_name().unwrap_or("-");
        let prompt = self
            .gaze
            .current_target()
            .and_then(|target| self.world.prop(target))
            .and_then(|prop| prop.prompt())
            .map(|prompt| format!(" [{prompt}]"))
            .unwrap_or_default();
        let pause = if self.is_paused() { " | paused" } else { "" };
        Some(format!(
            "Night {} | {:?}{} | item: {} | looking at: {}{}{}",
            self.progress.borrow().progress().current_night,
            actor.state(),
            if actor.is_crouched() { " (crouched)" } else { "" },
            if actor.has_item() { "yes" } else { "no" },
            looking_at,
            prompt,
            pause,
        ))
    }
}
