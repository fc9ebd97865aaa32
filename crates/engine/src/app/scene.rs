use glam::Vec2;
use tracing::info;

use super::input::{ActionStates, InputAction};
use super::touch::TouchPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Night,
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    Reload,
    Quit,
}

/// Immutable view of one tick of player input.
///
/// Held actions persist while the key is down; pressed edges, pointer motion and
/// touch phases only describe what happened since the previous tick.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
    primary_click_pressed: bool,
    pointer_delta: Vec2,
    touches: Vec<TouchPoint>,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        held: ActionStates,
        pressed: ActionStates,
        primary_click_pressed: bool,
        pointer_delta: Vec2,
        touches: Vec<TouchPoint>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            held,
            pressed,
            primary_click_pressed,
            pointer_delta,
            touches,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    /// True only on the tick the action went from released to pressed.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn primary_click_pressed(&self) -> bool {
        self.primary_click_pressed
    }

    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    pub fn touches(&self) -> &[TouchPoint] {
        &self.touches
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }

    pub fn with_primary_click_pressed(mut self, primary_click_pressed: bool) -> Self {
        self.primary_click_pressed = primary_click_pressed;
        self
    }

    pub fn with_pointer_delta(mut self, pointer_delta: Vec2) -> Self {
        self.pointer_delta = pointer_delta;
        self
    }

    pub fn with_touches(mut self, touches: Vec<TouchPoint>) -> Self {
        self.touches = touches;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }
}

/// Everything a per-frame operation may read: elapsed time and this tick's input.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub dt_seconds: f32,
    pub input: &'a InputSnapshot,
}

impl<'a> FrameContext<'a> {
    pub fn new(dt_seconds: f32, input: &'a InputSnapshot) -> Self {
        Self { dt_seconds, input }
    }
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, ctx: &FrameContext<'_>) -> SceneCommand;
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneRuntime {
    fn load(&mut self) {
        if !self.is_loaded {
            self.scene.load();
            self.is_loaded = true;
        }
    }

    fn unload(&mut self) {
        if self.is_loaded {
            self.scene.unload();
            self.is_loaded = false;
        }
    }
}

pub(crate) struct SceneMachine {
    night: SceneRuntime,
    office: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(night: Box<dyn Scene>, office: Box<dyn Scene>, active_scene: SceneKey) -> Self {
        Self {
            night: SceneRuntime {
                scene: night,
                is_loaded: false,
            },
            office: SceneRuntime {
                scene: office,
                is_loaded: false,
            },
            active_scene,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn load_active(&mut self) {
        let key = self.active_scene;
        self.runtime_mut(key).load();
    }

    pub(crate) fn update_active(&mut self, ctx: &FrameContext<'_>) -> SceneCommand {
        let key = self.active_scene;
        self.runtime_mut(key).scene.update(ctx)
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        self.runtime_ref(self.active_scene).scene.debug_title()
    }

    /// Applies a scene command. Returns `true` when the loop should exit.
    pub(crate) fn apply(&mut self, command: SceneCommand) -> bool {
        match command {
            SceneCommand::None => false,
            SceneCommand::SwitchTo(next_scene) => {
                if self.switch_to(next_scene) {
                    info!(scene = ?self.active_scene, "scene_switched");
                }
                false
            }
            SceneCommand::Reload => {
                self.reload_active();
                info!(scene = ?self.active_scene, "scene_reloaded");
                false
            }
            SceneCommand::Quit => {
                info!(reason = "scene_request", "shutdown_requested");
                true
            }
        }
    }

    pub(crate) fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        if self.active_scene == next_scene {
            return false;
        }

        // Only the active scene stays loaded, so every entry starts fresh.
        let previous = self.active_scene;
        self.runtime_mut(previous).unload();
        self.runtime_mut(next_scene).load();
        self.active_scene = next_scene;
        true
    }

    pub(crate) fn reload_active(&mut self) {
        let runtime = self.runtime_mut(self.active_scene);
        runtime.unload();
        runtime.load();
    }

    pub(crate) fn shutdown_all(&mut self) {
        self.night.unload();
        self.office.unload();
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Night => &self.night,
            SceneKey::Office => &self.office,
        }
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Night => &mut self.night,
            SceneKey::Office => &mut self.office,
        }
    }
}
