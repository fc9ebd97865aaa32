use tracing::warn;

/// Latch for configuration problems that are reported once and then stay quiet
/// until the configuration is corrected.
#[derive(Debug, Default)]
pub(crate) struct WarnOnce {
    fired: bool,
}

impl WarnOnce {
    pub(crate) fn should_warn(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }

    pub(crate) fn reset(&mut self) {
        self.fired = false;
    }
}

pub(crate) fn positive_or_default(setting: &'static str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        return value;
    }
    warn!(setting, value, default, "setting must be positive; reset to default");
    default
}

pub(crate) fn clamp_with_warning(setting: &'static str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = if value.is_nan() {
        min
    } else {
        value.max(min).min(max)
    };
    if clamped != value {
        warn!(setting, value, min, max, clamped, "setting out of range; clamped");
    }
    clamped
}
