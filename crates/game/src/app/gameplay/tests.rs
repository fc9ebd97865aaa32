use engine::{
    ActorState, CharacterBody, FrameContext, InputAction, InputMode, InputSnapshot,
    LookOrientation, Scene, SceneCommand, SceneKey, TouchPhase, TouchPoint,
};
use glam::{Vec2, Vec3};
use tempfile::TempDir;

use super::night::{NightScene, NIGHT_SPAWN};
use super::office::OfficeScene;
use super::props::PropKind;
use crate::app::progress::{GameProgress, ProgressStore, ProgressTracker, SharedProgress};
use crate::app::settings::GameSettings;

const DT: f32 = 0.1;

fn progress() -> (TempDir, SharedProgress) {
    let dir = tempfile::tempdir().expect("tempdir");
    let shared = ProgressTracker::open(ProgressStore::new(dir.path())).into_shared();
    (dir, shared)
}

fn loaded_night(settings: GameSettings) -> (TempDir, SharedProgress, NightScene) {
    let (dir, progress) = progress();
    let mut scene = NightScene::new(settings, std::rc::Rc::clone(&progress));
    scene.load();
    (dir, progress, scene)
}

fn tick<S: Scene>(scene: &mut S, input: &InputSnapshot) -> SceneCommand {
    scene.update(&FrameContext::new(DT, input))
}

fn pressed(action: InputAction) -> InputSnapshot {
    InputSnapshot::empty().with_action_pressed(action)
}

fn face(scene: &mut NightScene, position: Vec3, yaw: f32) {
    scene
        .controller_mut()
        .expect("controller")
        .teleport(position, LookOrientation::new(yaw, 0.0));
}

fn looking_at(scene: &NightScene) -> Option<PropKind> {
    let target = scene.gaze().current_target()?;
    scene.world().prop(target).map(|prop| prop.kind())
}

fn actor_state(scene: &NightScene) -> ActorState {
    scene.controller().expect("controller").actor().state()
}

#[test]
fn night_spawn_looks_at_flash_drive() {
    let (_dir, _progress, mut scene) = loaded_night(GameSettings::default());

    tick(&mut scene, &InputSnapshot::empty());

    assert_eq!(looking_at(&scene), Some(PropKind::FlashDrive));
    let drive = scene.world().find_prop(PropKind::FlashDrive).expect("drive");
    assert!(scene.world().prop(drive).expect("prop").is_looked_at());
}

#[test]
fn collecting_drive_then_leaving_completes_night() {
    let (_dir, progress, mut scene) = loaded_night(GameSettings::default());
    tick(&mut scene, &InputSnapshot::empty());

    assert_eq!(tick(&mut scene, &pressed(InputAction::Interact)), SceneCommand::None);
    let controller = scene.controller().expect("controller");
    assert!(controller.actor().has_item());
    assert!(scene.world().find_prop(PropKind::FlashDrive).is_none());

    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(looking_at(&scene), Some(PropKind::ExitDoor));

    let command = tick(&mut scene, &pressed(InputAction::Interact));

    assert_eq!(command, SceneCommand::SwitchTo(SceneKey::Office));
    assert_eq!(progress.borrow().progress().current_night, 2);
}

#[test]
fn exit_stays_locked_without_drive() {
    let (_dir, progress, mut scene) = loaded_night(GameSettings::default());
    face(&mut scene, Vec3::new(0.4, 0.0, -3.0), 0.0);
    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(looking_at(&scene), Some(PropKind::ExitDoor));

    let command = tick(&mut scene, &pressed(InputAction::Interact));

    assert_eq!(command, SceneCommand::None);
    assert_eq!(progress.borrow().progress(), GameProgress::default());
}

#[test]
fn locker_hides_and_interact_again_walks_out() {
    let (_dir, _progress, mut scene) = loaded_night(GameSettings::default());
    face(&mut scene, Vec3::ZERO, 90.0);
    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(looking_at(&scene), Some(PropKind::Locker));

    tick(&mut scene, &pressed(InputAction::Interact));
    assert_eq!(actor_state(&scene), ActorState::Hiding);

    let before = scene.controller().expect("controller").actor().body().position();
    tick(
        &mut scene,
        &InputSnapshot::empty().with_action_down(InputAction::MoveForward, true),
    );
    let after = scene.controller().expect("controller").actor().body().position();
    assert_eq!(before, after);

    tick(&mut scene, &pressed(InputAction::Interact));
    assert_eq!(actor_state(&scene), ActorState::Walking);
}

#[test]
fn pause_freezes_player_and_restores_previous_state() {
    let (_dir, _progress, mut scene) = loaded_night(GameSettings::default());

    tick(&mut scene, &pressed(InputAction::Pause));
    assert!(scene.is_paused());
    assert_eq!(actor_state(&scene), ActorState::InteractingUI);

    let walking = InputSnapshot::empty().with_action_down(InputAction::MoveForward, true);
    tick(&mut scene, &walking);
    let position = scene.controller().expect("controller").actor().body().position();
    assert!((position.z - NIGHT_SPAWN.z).abs() < 1e-5);

    tick(&mut scene, &pressed(InputAction::Interact));
    assert!(!scene.controller().expect("controller").actor().has_item());

    tick(&mut scene, &pressed(InputAction::Pause));
    assert!(!scene.is_paused());
    assert_eq!(actor_state(&scene), ActorState::Walking);
}

#[test]
fn debug_keys_complete_or_fail_night() {
    let (_dir, progress, mut scene) = loaded_night(GameSettings::default());

    assert_eq!(
        tick(&mut scene, &pressed(InputAction::DebugFailNight)),
        SceneCommand::Reload
    );
    assert_eq!(
        tick(&mut scene, &pressed(InputAction::DebugCompleteNight)),
        SceneCommand::SwitchTo(SceneKey::Office)
    );
    assert_eq!(
        progress.borrow().progress(),
        GameProgress {
            current_night: 2,
            total_deaths: 1
        }
    );
}

#[test]
fn looking_away_exits_target_once() {
    let (_dir, _progress, mut scene) = loaded_night(GameSettings::default());
    face(&mut scene, Vec3::ZERO, 270.0);
    tick(&mut scene, &InputSnapshot::empty());
    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(looking_at(&scene), Some(PropKind::Poster));

    face(&mut scene, Vec3::ZERO, 180.0);
    tick(&mut scene, &InputSnapshot::empty());

    let poster = scene.world().find_prop(PropKind::Poster).expect("poster");
    let prop = scene.world().prop(poster).expect("prop");
    assert_eq!((prop.enter_count, prop.stay_count, prop.exit_count), (1, 1, 1));
    assert!(!prop.is_looked_at());
    assert_eq!(looking_at(&scene), None);
}

#[test]
fn unload_clears_gaze_and_reload_resets_stage() {
    let (_dir, _progress, mut scene) = loaded_night(GameSettings::default());
    tick(&mut scene, &InputSnapshot::empty());
    tick(&mut scene, &pressed(InputAction::Interact));

    scene.unload();
    assert!(!scene.gaze().is_looking_at_target());
    assert!(scene.controller().is_none());

    scene.load();
    assert!(scene.world().find_prop(PropKind::FlashDrive).is_some());
    assert!(!scene.controller().expect("controller").actor().has_item());
}

#[test]
fn touch_joystick_walks_and_crouch_button_toggles() {
    let settings = GameSettings {
        input_mode: InputMode::Touch,
        ..GameSettings::default()
    };
    let layout = settings.touch_layout.clone();
    let (_dir, _progress, mut scene) = loaded_night(settings);

    let stick_top = Vec2::new(
        layout.joystick_center[0],
        layout.joystick_center[1] + layout.joystick_radius,
    );
    let input = InputSnapshot::empty()
        .with_touches(vec![TouchPoint::new(1, TouchPhase::Began, stick_top)]);
    tick(&mut scene, &input);

    let position = scene.controller().expect("controller").actor().body().position();
    assert!(position.z > NIGHT_SPAWN.z + 0.4);

    let button = Vec2::new(
        layout.crouch_button.min[0] + 10.0,
        layout.crouch_button.min[1] + 10.0,
    );
    let input = InputSnapshot::empty().with_touches(vec![
        TouchPoint::new(1, TouchPhase::Ended, stick_top),
        TouchPoint::new(2, TouchPhase::Began, button),
    ]);
    tick(&mut scene, &input);

    let controller = scene.controller().expect("controller");
    assert!(controller.actor().is_crouched());
    assert_eq!(controller.orientation().yaw, 0.0);
}

fn loaded_office() -> (TempDir, OfficeScene) {
    let (dir, progress) = progress();
    let mut scene = OfficeScene::new(GameSettings::default(), progress);
    scene.load();
    (dir, scene)
}

fn office_target(scene: &OfficeScene) -> Option<PropKind> {
    let target = scene.gaze().current_target()?;
    scene.world().prop(target).map(|prop| prop.kind())
}

#[test]
fn office_starts_facing_monitor() {
    let (_dir, mut scene) = loaded_office();
    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(office_target(&scene), Some(PropKind::Monitor));
}

#[test]
fn office_rotation_is_clamped_and_reaches_door() {
    let (_dir, mut scene) = loaded_office();
    let turning = InputSnapshot::empty().with_action_down(InputAction::RotateRight, true);

    for _ in 0..20 {
        tick(&mut scene, &turning);
    }

    let view = scene.view().expect("view");
    assert_eq!(view.current_yaw(), 80.0);
    assert_eq!(office_target(&scene), Some(PropKind::OfficeDoor));

    tick(&mut scene, &InputSnapshot::empty());
    let (_left, right) = scene.rotation_buttons();
    assert!(!right.borrow().is_pressed());
    assert_eq!(scene.view().expect("view").current_yaw(), 80.0);
}

#[test]
fn office_actions_hide_and_toggle_camera() {
    let (_dir, mut scene) = loaded_office();

    tick(&mut scene, &pressed(InputAction::Hide));
    assert_eq!(scene.actor().expect("actor").state(), ActorState::Hiding);
    tick(&mut scene, &pressed(InputAction::Hide));
    assert_eq!(scene.actor().expect("actor").state(), ActorState::Walking);

    tick(&mut scene, &pressed(InputAction::OpenCamera));
    assert!(scene.is_camera_open());
    assert_eq!(
        scene.actor().expect("actor").state(),
        ActorState::InteractingUI
    );
    tick(&mut scene, &pressed(InputAction::OpenCamera));
    assert!(!scene.is_camera_open());
}

#[test]
fn office_switch_returns_to_night() {
    let (_dir, mut scene) = loaded_office();
    assert_eq!(
        tick(&mut scene, &pressed(InputAction::SwitchScene)),
        SceneCommand::SwitchTo(SceneKey::Night)
    );
}

#[test]
fn office_title_reports_yaw() {
    let (_dir, mut scene) = loaded_office();
    tick(&mut scene, &InputSnapshot::empty());
    let title = scene.debug_title().expect("title");
    assert!(title.contains("yaw 0"));
    assert!(title.contains("security monitor"));
}

#[test]
fn night_title_shows_prompt_of_looked_at_prop() {
    let (_dir, _progress, mut scene) = loaded_night(GameSettings::default());
    tick(&mut scene, &InputSnapshot::empty());

    let title = scene.debug_title().expect("title");
    assert!(title.starts_with("Night 1"));
    assert!(title.contains("looking at: flash drive [Pick up]"));
}

#[test]
fn reentered_night_starts_over_without_the_drive() {
    let (_dir, progress, mut scene) = loaded_night(GameSettings::default());
    tick(&mut scene, &InputSnapshot::empty());
    tick(&mut scene, &pressed(InputAction::Interact));
    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(
        tick(&mut scene, &pressed(InputAction::Interact)),
        SceneCommand::SwitchTo(SceneKey::Office)
    );

    scene.unload();
    scene.load();
    face(&mut scene, Vec3::new(0.4, 0.0, -3.0), 0.0);
    tick(&mut scene, &InputSnapshot::empty());
    assert_eq!(looking_at(&scene), Some(PropKind::ExitDoor));

    assert_eq!(tick(&mut scene, &pressed(InputAction::Interact)), SceneCommand::None);
    assert_eq!(progress.borrow().progress().current_night, 2);
}
