use glam::Vec2;

pub(crate) const DOUBLE_TAP_WINDOW_SECONDS: f64 = 0.3;
pub(crate) const DOUBLE_TAP_RADIUS_PX: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Canceled,
}

impl TouchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Canceled)
    }
}

/// One finger as seen by a single tick. Positions are window pixels with the
/// origin in the bottom-left corner and y growing upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub finger_id: u64,
    pub phase: TouchPhase,
    pub position: Vec2,
    pub tap_count: u32,
}

impl TouchPoint {
    pub fn new(finger_id: u64, phase: TouchPhase, position: Vec2) -> Self {
        Self {
            finger_id,
            phase,
            position,
            tap_count: 1,
        }
    }

    pub fn with_tap_count(mut self, tap_count: u32) -> Self {
        self.tap_count = tap_count;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

#[derive(Debug, Clone, Copy)]
struct TrackedTouch {
    finger_id: u64,
    phase: TouchPhase,
    position: Vec2,
    tap_count: u32,
    /// Terminal phase held back until the `Began` tick has been reported.
    pending_end: Option<TouchPhase>,
}

#[derive(Debug, Clone, Copy)]
struct TapRecord {
    position: Vec2,
    started_at_seconds: f64,
    count: u32,
}

/// Folds raw platform touch events into per-tick [`TouchPoint`]s.
#[derive(Debug, Default)]
pub(crate) struct TouchTracker {
    touches: Vec<TrackedTouch>,
    last_tap: Option<TapRecord>,
}

impl TouchTracker {
    pub(crate) fn began(&mut self, finger_id: u64, position: Vec2, now_seconds: f64) {
        let tap_count = self.next_tap_count(position, now_seconds);
        self.touches.retain(|touch| touch.finger_id != finger_id);
        self.touches.push(TrackedTouch {
            finger_id,
            phase: TouchPhase::Began,
            position,
            tap_count,
            pending_end: None,
        });
    }

    pub(crate) fn moved(&mut self, finger_id: u64, position: Vec2) {
        if let Some(touch) = self.find_mut(finger_id) {
            touch.position = position;
            if touch.phase == TouchPhase::Stationary {
                touch.phase = TouchPhase::Moved;
            }
        }
    }

    pub(crate) fn ended(&mut self, finger_id: u64, position: Vec2, canceled: bool) {
        let terminal = if canceled {
            TouchPhase::Canceled
        } else {
            TouchPhase::Ended
        };
        if let Some(touch) = self.find_mut(finger_id) {
            touch.position = position;
            if touch.phase == TouchPhase::Began {
                touch.pending_end = Some(terminal);
            } else {
                touch.phase = terminal;
            }
        }
    }

    pub(crate) fn snapshot_for_tick(&mut self) -> Vec<TouchPoint> {
        let points = self
            .touches
            .iter()
            .map(|touch| TouchPoint {
                finger_id: touch.finger_id,
                phase: touch.phase,
                position: touch.position,
                tap_count: touch.tap_count,
            })
            .collect();

        self.touches.retain(|touch| !touch.phase.is_terminal());
        for touch in &mut self.touches {
            touch.phase = touch.pending_end.take().unwrap_or(TouchPhase::Stationary);
        }
        points
    }

    fn find_mut(&mut self, finger_id: u64) -> Option<&mut TrackedTouch> {
        self.touches
            .iter_mut()
            .find(|touch| touch.finger_id == finger_id)
    }

    fn next_tap_count(&mut self, position: Vec2, now_seconds: f64) -> u32 {
        let count = match self.last_tap {
            Some(previous)
                if now_seconds - previous.started_at_seconds <= DOUBLE_TAP_WINDOW_SECONDS
                    && previous.position.distance(position) <= DOUBLE_TAP_RADIUS_PX =>
            {
                previous.count.saturating_add(1)
            }
            _ => 1,
        };
        self.last_tap = Some(TapRecord {
            position,
            started_at_seconds: now_seconds,
            count,
        });
        count
    }
}
