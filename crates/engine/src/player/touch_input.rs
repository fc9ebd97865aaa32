use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::source::InputSource;
use super::validate::{clamp_with_warning, positive_or_default};
use crate::app::{FrameContext, ScreenRect, TouchPhase, TouchPoint};

pub const DEFAULT_TOUCH_SENSITIVITY: f32 = 1.5;
pub const DEFAULT_HANDLE_RANGE: f32 = 50.0;
pub const DEFAULT_JOYSTICK_DEAD_ZONE: f32 = 0.1;
pub const MAX_JOYSTICK_DEAD_ZONE: f32 = 0.95;
pub const PAUSE_TOUCH_COUNT: usize = 3;

pub trait Joystick {
    /// Dead-zone compensated, magnitude at most 1.
    fn direction(&self) -> Vec2;
    fn is_active(&self) -> bool;
}

pub trait DeadZone {
    fn is_point_in_dead_zone(&self, point: Vec2) -> bool;
}

impl<T: Joystick> Joystick for Rc<RefCell<T>> {
    fn direction(&self) -> Vec2 {
        self.borrow().direction()
    }

    fn is_active(&self) -> bool {
        self.borrow().is_active()
    }
}

impl<T: DeadZone> DeadZone for Rc<RefCell<T>> {
    fn is_point_in_dead_zone(&self, point: Vec2) -> bool {
        self.borrow().is_point_in_dead_zone(point)
    }
}

impl DeadZone for ScreenRect {
    fn is_point_in_dead_zone(&self, point: Vec2) -> bool {
        self.contains(point)
    }
}

/// Screen region excluded from camera look; can be switched off at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDeadZone {
    pub rect: ScreenRect,
    pub enabled: bool,
}

impl CameraDeadZone {
    pub fn new(rect: ScreenRect) -> Self {
        Self {
            rect,
            enabled: true,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl DeadZone for CameraDeadZone {
    fn is_point_in_dead_zone(&self, point: Vec2) -> bool {
        self.enabled && self.rect.contains(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickSettings {
    /// Pixels the drawn handle may travel from the center.
    pub handle_range: f32,
    /// Fraction of the radius treated as no input.
    pub dead_zone: f32,
}

impl Default for JoystickSettings {
    fn default() -> Self {
        Self {
            handle_range: DEFAULT_HANDLE_RANGE,
            dead_zone: DEFAULT_JOYSTICK_DEAD_ZONE,
        }
    }
}

impl JoystickSettings {
    pub(crate) fn validated(self) -> Self {
        Self {
            handle_range: positive_or_default(
                "joystick.handle_range",
                self.handle_range,
                DEFAULT_HANDLE_RANGE,
            ),
            dead_zone: clamp_with_warning(
                "joystick.dead_zone",
                self.dead_zone,
                0.0,
                MAX_JOYSTICK_DEAD_ZONE,
            ),
        }
    }
}

/// Circular on-screen stick claimed by the first touch that begins inside it.
#[derive(Debug, Clone)]
pub struct VirtualJoystick {
    center: Vec2,
    radius: f32,
    settings: JoystickSettings,
    finger: Option<u64>,
    direction: Vec2,
    handle_offset: Vec2,
}

impl VirtualJoystick {
    pub fn new(center: Vec2, radius: f32, settings: JoystickSettings) -> Self {
        Self {
            center,
            radius: positive_or_default("joystick.radius", radius, DEFAULT_HANDLE_RANGE),
            settings: settings.validated(),
            finger: None,
            direction: Vec2::ZERO,
            handle_offset: Vec2::ZERO,
        }
    }

    pub fn into_handle(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance(self.center) <= self.radius
    }

    pub fn handle_offset(&self) -> Vec2 {
        self.handle_offset
    }

    pub fn settings(&self) -> JoystickSettings {
        self.settings
    }

    /// Folds this tick's touches into the stick. Call before the input source reads it.
    pub fn track(&mut self, touches: &[TouchPoint]) {
        for touch in touches {
            match self.finger {
                Some(finger) if finger == touch.finger_id => {
                    if touch.phase.is_terminal() {
                        self.release();
                    } else {
                        self.drag(touch.position);
                    }
                }
                None if touch.phase == TouchPhase::Began && self.contains(touch.position) => {
                    self.finger = Some(touch.finger_id);
                    debug!(finger = touch.finger_id, "joystick_claimed");
                    self.drag(touch.position);
                }
                _ => {}
            }
        }

        if let Some(finger) = self.finger {
            if !touches.iter().any(|touch| touch.finger_id == finger) {
                self.release();
            }
        }
    }

    fn drag(&mut self, position: Vec2) {
        let offset = ((position - self.center) / self.radius).clamp_length_max(1.0);
        self.handle_offset = offset * self.settings.handle_range;

        let magnitude = offset.length();
        let dead_zone = self.settings.dead_zone;
        self.direction = if magnitude <= dead_zone {
            Vec2::ZERO
        } else {
            offset.normalize_or_zero() * ((magnitude - dead_zone) / (1.0 - dead_zone))
        };
    }

    fn release(&mut self) {
        self.finger = None;
        self.direction = Vec2::ZERO;
        self.handle_offset = Vec2::ZERO;
    }
}

impl Joystick for VirtualJoystick {
    fn direction(&self) -> Vec2 {
        self.direction
    }

    fn is_active(&self) -> bool {
        self.finger.is_some()
    }
}

/// On-screen crouch toggle. Touches on it never drive the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrouchButton {
    pub rect: ScreenRect,
}

impl CrouchButton {
    pub fn new(rect: ScreenRect) -> Self {
        Self { rect }
    }

    /// True when a touch began on the button this tick.
    pub fn was_tapped(&self, touches: &[TouchPoint]) -> bool {
        touches
            .iter()
            .any(|touch| touch.phase == TouchPhase::Began && self.rect.contains(touch.position))
    }
}

impl DeadZone for CrouchButton {
    fn is_point_in_dead_zone(&self, point: Vec2) -> bool {
        self.rect.contains(point)
    }
}

/// Touch backend: joystick movement plus one tracked camera finger for look.
pub struct TouchInput {
    sensitivity: f32,
    joystick: Option<Box<dyn Joystick>>,
    dead_zones: Vec<Box<dyn DeadZone>>,
    camera_finger: Option<u64>,
    last_touch_position: Vec2,
}

impl Default for TouchInput {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_SENSITIVITY)
    }
}

impl TouchInput {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            sensitivity: positive_or_default(
                "touch_sensitivity",
                sensitivity,
                DEFAULT_TOUCH_SENSITIVITY,
            ),
            joystick: None,
            dead_zones: Vec::new(),
            camera_finger: None,
            last_touch_position: Vec2::ZERO,
        }
    }

    pub fn set_joystick(&mut self, joystick: Option<Box<dyn Joystick>>) {
        self.joystick = joystick;
    }

    pub fn add_dead_zone(&mut self, dead_zone: Box<dyn DeadZone>) {
        self.dead_zones.push(dead_zone);
    }

    pub fn clear_dead_zones(&mut self) {
        self.dead_zones.clear();
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn camera_finger(&self) -> Option<u64> {
        self.camera_finger
    }

    fn joystick_active(&self) -> bool {
        self.joystick
            .as_ref()
            .is_some_and(|joystick| joystick.is_active())
    }

    fn in_dead_zone(&self, point: Vec2) -> bool {
        self.dead_zones
            .iter()
            .any(|zone| zone.is_point_in_dead_zone(point))
    }

    /// Follows the camera finger for this tick and returns its look delta.
    ///
    /// Owners call this even while look is ignored so claims and positions stay
    /// current.
    pub fn track(&mut self, ctx: &FrameContext<'_>) -> Vec2 {
        let touches = ctx.input.touches();
        if let Some(finger) = self.camera_finger {
            if !touches.iter().any(|touch| touch.finger_id == finger) {
                self.release_camera_finger(finger);
            }
        }

        let joystick_active = self.joystick_active();
        let mut look = Vec2::ZERO;
        for touch in touches {
            let claimed = self.camera_finger == Some(touch.finger_id);
            if touch.phase.is_terminal() {
                if claimed {
                    self.release_camera_finger(touch.finger_id);
                }
                continue;
            }

            if joystick_active || self.in_dead_zone(touch.position) {
                // Keeps the next delta from jumping once the finger counts again.
                if claimed {
                    self.last_touch_position = touch.position;
                }
                continue;
            }

            match touch.phase {
                // First claim seen in touch order wins; later fingers wait for release.
                TouchPhase::Began if self.camera_finger.is_none() => {
                    self.camera_finger = Some(touch.finger_id);
                    self.last_touch_position = touch.position;
                    debug!(finger = touch.finger_id, "camera_finger_claimed");
                }
                TouchPhase::Moved if claimed => {
                    let delta = touch.position - self.last_touch_position;
                    look += delta * self.sensitivity * ctx.dt_seconds;
                    self.last_touch_position = touch.position;
                }
                _ => {}
            }
        }
        look
    }

    fn release_camera_finger(&mut self, finger: u64) {
        self.camera_finger = None;
        debug!(finger, "camera_finger_released");
    }
}

impl InputSource for TouchInput {
    fn movement(&self, _ctx: &FrameContext<'_>) -> Vec2 {
        self.joystick
            .as_ref()
            .map_or(Vec2::ZERO, |joystick| joystick.direction())
    }

    fn look(&mut self, ctx: &FrameContext<'_>) -> Vec2 {
        self.track(ctx)
    }

    fn interact(&self, ctx: &FrameContext<'_>) -> bool {
        let Some(first) = ctx.input.touches().first() else {
            return false;
        };
        first.phase == TouchPhase::Began
            && first.tap_count == 2
            && !self.joystick_active()
            && !self.in_dead_zone(first.position)
    }

    fn pause(&self, ctx: &FrameContext<'_>) -> bool {
        let active = ctx
            .input
            .touches()
            .iter()
            .filter(|touch| !touch.phase.is_terminal())
            .count();
        active >= PAUSE_TOUCH_COUNT
    }

    fn crouch(&self, _ctx: &FrameContext<'_>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::InputSnapshot;

    fn touch(id: u64, phase: TouchPhase, x: f32, y: f32) -> TouchPoint {
        TouchPoint::new(id, phase, Vec2::new(x, y))
    }

    fn look_with(source: &mut TouchInput, touches: Vec<TouchPoint>, dt: f32) -> Vec2 {
        let input = InputSnapshot::empty().with_touches(touches);
        source.look(&FrameContext::new(dt, &input))
    }

    fn stick() -> Rc<RefCell<VirtualJoystick>> {
        VirtualJoystick::new(Vec2::new(100.0, 100.0), 80.0, JoystickSettings::default())
            .into_handle()
    }

    #[test]
    fn claimed_finger_drives_look() {
        let mut source = TouchInput::new(2.0);
        look_with(&mut source, vec![touch(1, TouchPhase::Began, 500.0, 300.0)], 0.5);

        let look = look_with(&mut source, vec![touch(1, TouchPhase::Moved, 510.0, 296.0)], 0.5);

        assert_eq!(source.camera_finger(), Some(1));
        assert_eq!(look, Vec2::new(10.0, -4.0));
    }

    #[test]
    fn unclaimed_finger_does_not_alter_look() {
        let mut source = TouchInput::default();
        look_with(&mut source, vec![touch(1, TouchPhase::Began, 500.0, 300.0)], 0.1);

        let look = look_with(
            &mut source,
            vec![
                touch(1, TouchPhase::Stationary, 500.0, 300.0),
                touch(2, TouchPhase::Moved, 900.0, 100.0),
            ],
            0.1,
        );

        assert_eq!(look, Vec2::ZERO);
        assert_eq!(source.camera_finger(), Some(1));
    }

    #[test]
    fn first_began_touch_wins_claim() {
        let mut source = TouchInput::default();
        look_with(
            &mut source,
            vec![
                touch(4, TouchPhase::Began, 600.0, 300.0),
                touch(9, TouchPhase::Began, 700.0, 300.0),
            ],
            0.1,
        );
        assert_eq!(source.camera_finger(), Some(4));
    }

    #[test]
    fn ended_finger_releases_claim_for_next_touch() {
        let mut source = TouchInput::default();
        look_with(&mut source, vec![touch(1, TouchPhase::Began, 500.0, 300.0)], 0.1);
        look_with(&mut source, vec![touch(1, TouchPhase::Ended, 500.0, 300.0)], 0.1);
        assert_eq!(source.camera_finger(), None);

        look_with(&mut source, vec![touch(2, TouchPhase::Began, 300.0, 300.0)], 0.1);
        assert_eq!(source.camera_finger(), Some(2));
    }

    #[test]
    fn vanished_finger_releases_claim() {
        let mut source = TouchInput::default();
        look_with(&mut source, vec![touch(1, TouchPhase::Began, 500.0, 300.0)], 0.1);
        look_with(&mut source, Vec::new(), 0.1);
        assert_eq!(source.camera_finger(), None);
    }

    #[test]
    fn dead_zone_touches_never_claim() {
        let mut source = TouchInput::default();
        source.add_dead_zone(Box::new(CameraDeadZone::new(ScreenRect::new(
            Vec2::ZERO,
            Vec2::new(200.0, 200.0),
        ))));

        look_with(&mut source, vec![touch(1, TouchPhase::Began, 50.0, 50.0)], 0.1);
        let look = look_with(&mut source, vec![touch(1, TouchPhase::Moved, 80.0, 60.0)], 0.1);

        assert_eq!(source.camera_finger(), None);
        assert_eq!(look, Vec2::ZERO);
    }

    #[test]
    fn disabled_dead_zone_lets_touches_through() {
        let zone = Rc::new(RefCell::new(CameraDeadZone::new(ScreenRect::new(
            Vec2::ZERO,
            Vec2::new(200.0, 200.0),
        ))));
        let mut source = TouchInput::default();
        source.add_dead_zone(Box::new(Rc::clone(&zone)));
        zone.borrow_mut().set_enabled(false);

        look_with(&mut source, vec![touch(1, TouchPhase::Began, 50.0, 50.0)], 0.1);
        assert_eq!(source.camera_finger(), Some(1));
    }

    #[test]
    fn active_joystick_blocks_look() {
        let joystick = stick();
        let mut source = TouchInput::default();
        source.set_joystick(Some(Box::new(Rc::clone(&joystick))));

        let touches = vec![
            touch(1, TouchPhase::Began, 100.0, 120.0),
            touch(2, TouchPhase::Began, 800.0, 400.0),
        ];
        joystick.borrow_mut().track(&touches);
        look_with(&mut source, touches, 0.1);

        assert!(joystick.borrow().is_active());
        assert_eq!(source.camera_finger(), None);
    }

    #[test]
    fn movement_reads_joystick_direction() {
        let joystick = stick();
        let mut source = TouchInput::default();
        source.set_joystick(Some(Box::new(Rc::clone(&joystick))));
        let input = InputSnapshot::empty();
        let ctx = FrameContext::new(0.1, &input);
        assert_eq!(source.movement(&ctx), Vec2::ZERO);

        joystick
            .borrow_mut()
            .track(&[touch(1, TouchPhase::Began, 180.0, 100.0)]);
        let movement = source.movement(&ctx);
        assert!((movement - Vec2::new(1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn joystick_applies_dead_zone_and_clamps_to_unit_length() {
        let mut joystick =
            VirtualJoystick::new(Vec2::ZERO, 100.0, JoystickSettings::default());

        joystick.track(&[touch(1, TouchPhase::Began, 5.0, 0.0)]);
        assert!(joystick.is_active());
        assert_eq!(joystick.direction(), Vec2::ZERO);

        joystick.track(&[touch(1, TouchPhase::Moved, 0.0, 55.0)]);
        assert!((joystick.direction() - Vec2::new(0.0, 0.5)).length() < 1e-5);

        joystick.track(&[touch(1, TouchPhase::Moved, 0.0, -400.0)]);
        assert!((joystick.direction() - Vec2::new(0.0, -1.0)).length() < 1e-5);
        assert!((joystick.handle_offset() - Vec2::new(0.0, -50.0)).length() < 1e-4);

        joystick.track(&[touch(1, TouchPhase::Ended, 0.0, -400.0)]);
        assert!(!joystick.is_active());
        assert_eq!(joystick.direction(), Vec2::ZERO);
        assert_eq!(joystick.handle_offset(), Vec2::ZERO);
    }

    #[test]
    fn joystick_ignores_touches_that_begin_outside() {
        let mut joystick =
            VirtualJoystick::new(Vec2::ZERO, 100.0, JoystickSettings::default());
        joystick.track(&[touch(1, TouchPhase::Began, 300.0, 0.0)]);
        joystick.track(&[touch(1, TouchPhase::Moved, 10.0, 0.0)]);
        assert!(!joystick.is_active());
    }

    #[test]
    fn joystick_dead_zone_is_clamped() {
        let settings = JoystickSettings {
            handle_range: -1.0,
            dead_zone: 1.4,
        }
        .validated();
        assert_eq!(settings.handle_range, DEFAULT_HANDLE_RANGE);
        assert_eq!(settings.dead_zone, MAX_JOYSTICK_DEAD_ZONE);
    }

    #[test]
    fn double_tap_on_first_touch_interacts() {
        let source = TouchInput::default();
        let tapped = InputSnapshot::empty()
            .with_touches(vec![touch(3, TouchPhase::Began, 400.0, 300.0).with_tap_count(2)]);
        assert!(source.interact(&FrameContext::new(0.1, &tapped)));

        let single = InputSnapshot::empty()
            .with_touches(vec![touch(3, TouchPhase::Began, 400.0, 300.0)]);
        assert!(!source.interact(&FrameContext::new(0.1, &single)));
    }

    #[test]
    fn double_tap_inside_dead_zone_is_ignored() {
        let mut source = TouchInput::default();
        source.add_dead_zone(Box::new(ScreenRect::new(Vec2::ZERO, Vec2::new(100.0, 100.0))));
        let input = InputSnapshot::empty()
            .with_touches(vec![touch(3, TouchPhase::Began, 50.0, 50.0).with_tap_count(2)]);
        assert!(!source.interact(&FrameContext::new(0.1, &input)));
    }

    #[test]
    fn three_touches_pause_two_do_not() {
        let source = TouchInput::default();
        let three = InputSnapshot::empty().with_touches(vec![
            touch(1, TouchPhase::Began, 100.0, 100.0),
            touch(2, TouchPhase::Began, 300.0, 100.0),
            touch(3, TouchPhase::Began, 500.0, 100.0),
        ]);
        assert!(source.pause(&FrameContext::new(0.1, &three)));

        let two = InputSnapshot::empty().with_touches(vec![
            touch(1, TouchPhase::Began, 100.0, 100.0),
            touch(2, TouchPhase::Began, 300.0, 100.0),
        ]);
        assert!(!source.pause(&FrameContext::new(0.1, &two)));
    }

    #[test]
    fn three_held_fingers_keep_reporting_pause() {
        let source = TouchInput::default();
        let held = InputSnapshot::empty().with_touches(vec![
            touch(1, TouchPhase::Stationary, 100.0, 100.0),
            touch(2, TouchPhase::Stationary, 300.0, 100.0),
            touch(3, TouchPhase::Moved, 500.0, 100.0),
        ]);
        assert!(source.pause(&FrameContext::new(0.1, &held)));

        let lifting = InputSnapshot::empty().with_touches(vec![
            touch(1, TouchPhase::Stationary, 100.0, 100.0),
            touch(2, TouchPhase::Stationary, 300.0, 100.0),
            touch(3, TouchPhase::Ended, 500.0, 100.0),
        ]);
        assert!(!source.pause(&FrameContext::new(0.1, &lifting)));
    }

    #[test]
    fn crouch_button_reports_taps_and_blocks_look() {
        let button = CrouchButton::new(ScreenRect::new(
            Vec2::new(1000.0, 0.0),
            Vec2::new(100.0, 100.0),
        ));
        let on_button = [touch(1, TouchPhase::Began, 1050.0, 50.0)];
        assert!(button.was_tapped(&on_button));
        assert!(!button.was_tapped(&[touch(1, TouchPhase::Stationary, 1050.0, 50.0)]));

        let mut source = TouchInput::default();
        source.add_dead_zone(Box::new(button));
        look_with(&mut source, on_button.to_vec(), 0.1);
        assert_eq!(source.camera_finger(), None);
        assert!(!source.crouch(&FrameContext::new(0.1, &InputSnapshot::empty())));
    }
}
