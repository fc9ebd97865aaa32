use std::thread;
use std::time::{Duration, Instant};

use glam::Vec2;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{
    DeviceEvent, ElementState, Event, KeyEvent, MouseButton, Touch, TouchPhase as WinitTouchPhase,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowBuilder};

use super::input::ActionStates;
use super::scene::SceneMachine;
use super::touch::TouchTracker;
use super::{FrameContext, InputAction, InputSnapshot, Scene, SceneKey};

/// One look axis unit per ten pixels of raw pointer motion.
const POINTER_AXIS_UNITS_PER_PIXEL: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorMode {
    /// Hidden and locked to the window, for pointer-driven free look.
    #[default]
    Locked,
    /// Visible and free, for touch or on-screen buttons.
    Free,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub max_render_fps: Option<u32>,
    pub cursor_mode: CursorMode,
    pub initial_scene: SceneKey,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Nightwatch".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_render_fps: Some(120),
            cursor_mode: CursorMode::Locked,
            initial_scene: SceneKey::Night,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    night: Box<dyn Scene>,
    office: Box<dyn Scene>,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(night, office, config.initial_scene);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = WindowBuilder::new()
        .with_title(config.window_title.clone())
        .with_inner_size(LogicalSize::new(
            config.window_width as f64,
            config.window_height as f64,
        ))
        .build(&event_loop)
        .map_err(AppError::CreateWindow)?;
    apply_cursor_mode(&window, config.cursor_mode);

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let initial_size = window.inner_size();
    let mut input_collector = InputCollector::new(initial_size.width, initial_size.height);

    scenes.load_active();
    info!(scene = ?scenes.active_scene(), "scene_loaded");
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        render_fps_cap = %format_render_cap(effective_render_cap),
        cursor_mode = ?config.cursor_mode,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                }
                WindowEvent::Focused(false) => {
                    input_collector.release_all();
                }
                WindowEvent::Focused(true) => {
                    apply_cursor_mode(&window, config.cursor_mode);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::Touch(touch) => {
                    input_collector.handle_touch(touch);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        if input_snapshot.quit_requested() {
                            break;
                        }
                        let ctx = FrameContext::new(fixed_dt_seconds, &input_snapshot);
                        let command = scenes.update_active(&ctx);
                        if scenes.apply(command) {
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    // Single sleep point for frame pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }
                    last_present_instant = Instant::now();

                    let next_title = scenes.debug_title_active();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }
                }
                _ => {}
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                input_collector.handle_pointer_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                scenes.shutdown_all();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn apply_cursor_mode(window: &Window, mode: CursorMode) {
    match mode {
        CursorMode::Locked => {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(error) = grabbed {
                warn!(error = %error, "cursor_grab_failed");
            }
            window.set_cursor_visible(false);
        }
        CursorMode::Free => {
            if let Err(error) = window.set_cursor_grab(CursorGrabMode::None) {
                warn!(error = %error, "cursor_release_failed");
            }
            window.set_cursor_visible(true);
        }
    }
}

#[derive(Debug)]
struct InputCollector {
    quit_requested: bool,
    held: ActionStates,
    pressed_edges: ActionStates,
    primary_is_down: bool,
    primary_pressed_edge: bool,
    pointer_delta: Vec2,
    touches: TouchTracker,
    window_width: u32,
    window_height: u32,
    clock_start: Instant,
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            quit_requested: false,
            held: ActionStates::default(),
            pressed_edges: ActionStates::default(),
            primary_is_down: false,
            primary_pressed_edge: false,
            pointer_delta: Vec2::ZERO,
            touches: TouchTracker::default(),
            window_width,
            window_height,
            clock_start: Instant::now(),
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn release_all(&mut self) {
        self.held.clear();
        self.primary_is_down = false;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        if key_event.repeat {
            return;
        }
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(action) = action_for_key(code) else {
            return;
        };
        if is_pressed && !self.held.is_down(action) {
            self.pressed_edges.set(action, true);
        }
        self.held.set(action, is_pressed);
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.primary_is_down {
                    self.primary_pressed_edge = true;
                }
                self.primary_is_down = true;
            }
            ElementState::Released => self.primary_is_down = false,
        }
    }

    /// Raw device motion is y-down; look axes are y-up.
    fn handle_pointer_motion(&mut self, dx: f64, dy: f64) {
        self.pointer_delta += Vec2::new(dx as f32, -(dy as f32)) * POINTER_AXIS_UNITS_PER_PIXEL;
    }

    fn handle_touch(&mut self, touch: Touch) {
        let position = Vec2::new(
            touch.location.x as f32,
            self.window_height as f32 - touch.location.y as f32,
        );
        match touch.phase {
            WinitTouchPhase::Started => {
                let now_seconds = self.clock_start.elapsed().as_secs_f64();
                self.touches.began(touch.id, position, now_seconds);
            }
            WinitTouchPhase::Moved => self.touches.moved(touch.id, position),
            WinitTouchPhase::Ended => self.touches.ended(touch.id, position, false),
            WinitTouchPhase::Cancelled => self.touches.ended(touch.id, position, true),
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.held,
            self.pressed_edges,
            self.primary_pressed_edge,
            self.pointer_delta,
            self.touches.snapshot_for_tick(),
            self.window_width,
            self.window_height,
        );
        self.pressed_edges.clear();
        self.primary_pressed_edge = false;
        self.pointer_delta = Vec2::ZERO;
        snapshot
    }
}

fn action_for_key(code: KeyCode) -> Option<InputAction> {
    let action = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveForward,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveBack,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::KeyE => InputAction::Interact,
        KeyCode::Escape => InputAction::Pause,
        KeyCode::ControlLeft | KeyCode::ControlRight => InputAction::Crouch,
        KeyCode::KeyQ => InputAction::RotateLeft,
        KeyCode::KeyR => InputAction::RotateRight,
        KeyCode::KeyH => InputAction::Hide,
        KeyCode::KeyC => InputAction::OpenCamera,
        KeyCode::Tab => InputAction::SwitchScene,
        KeyCode::F5 => InputAction::DebugCompleteNight,
        KeyCode::F9 => InputAction::DebugFailNight,
        _ => return None,
    };
    Some(action)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };

    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(input: &mut InputCollector, code: KeyCode) {
        input.update_action_state_from_physical_key(PhysicalKey::Code(code), true);
    }

    fn release(input: &mut InputCollector, code: KeyCode) {
        input.update_action_state_from_physical_key(PhysicalKey::Code(code), false);
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let result = plan_sim_steps(Duration::from_millis(48), Duration::from_millis(16), 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let result = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn key_press_is_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyE);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!(first.was_pressed(InputAction::Interact));
        assert!(!second.was_pressed(InputAction::Interact));
        assert!(second.is_down(InputAction::Interact));
    }

    #[test]
    fn close_request_reaches_the_tick_snapshot() {
        let mut input = InputCollector::default();
        assert!(!input.snapshot_for_tick().quit_requested());

        input.mark_quit_requested();

        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn held_key_does_not_spam_press_edges() {
        let mut input = InputCollector::default();

        press(&mut input, KeyCode::Escape);
        let first = input.snapshot_for_tick();
        press(&mut input, KeyCode::Escape);
        let second = input.snapshot_for_tick();
        release(&mut input, KeyCode::Escape);
        press(&mut input, KeyCode::Escape);
        let third = input.snapshot_for_tick();

        assert!(first.was_pressed(InputAction::Pause));
        assert!(!second.was_pressed(InputAction::Pause));
        assert!(third.was_pressed(InputAction::Pause));
    }

    #[test]
    fn either_control_key_maps_to_crouch() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::ControlRight);
        assert!(input.snapshot_for_tick().was_pressed(InputAction::Crouch));

        release(&mut input, KeyCode::ControlRight);
        press(&mut input, KeyCode::ControlLeft);
        assert!(input.snapshot_for_tick().was_pressed(InputAction::Crouch));
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_movement() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyW);
        press(&mut input, KeyCode::ArrowLeft);

        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveForward));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn primary_click_is_edge_triggered() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let first = input.snapshot_for_tick();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let second = input.snapshot_for_tick();

        assert!(first.primary_click_pressed());
        assert!(!second.primary_click_pressed());
    }

    #[test]
    fn pointer_motion_accumulates_then_resets() {
        let mut input = InputCollector::new(1280, 720);
        input.handle_pointer_motion(10.0, 20.0);
        input.handle_pointer_motion(10.0, -40.0);

        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();

        assert!((first.pointer_delta().x - 2.0).abs() < 0.0001);
        assert!((first.pointer_delta().y - 2.0).abs() < 0.0001);
        assert_eq!(second.pointer_delta(), Vec2::ZERO);
    }

    #[test]
    fn release_all_clears_held_actions() {
        let mut input = InputCollector::default();
        press(&mut input, KeyCode::KeyD);
        input.release_all();

        assert!(!input.snapshot_for_tick().is_down(InputAction::MoveRight));
    }

    #[test]
    fn compute_cap_sleep_respects_target() {
        let target = target_frame_duration(Some(60));
        assert_eq!(compute_cap_sleep(Duration::from_millis(20), target), Duration::ZERO);
        assert!(compute_cap_sleep(Duration::from_millis(5), target) > Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::from_millis(5), None), Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(120)), Some(120));
    }
}
