use crate::constants::defaults::{MAX_BRIGHTNESS, MAX_ZERO_ANGLE_COUNT, MIN_BRIGHTNESS};

/// Validated audit configuration produced by the command surface.
#[derive(Clone, Copy, Debug)]
pub struct AuditConfig {
    /// Persist findings into the manifest deletion index when true;
    /// otherwise the pass is a dry run and the store is never touched.
    pub remove: bool,
    /// Mean grayscale intensities strictly above this are flagged.
    pub max_brightness: f64,
    /// Mean grayscale intensities strictly below this are flagged.
    pub min_brightness: f64,
    /// Zero-angle runs longer than this are candidates for flagging.
    pub max_zero_angle_count: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            remove: false,
            max_brightness: MAX_BRIGHTNESS,
            min_brightness: MIN_BRIGHTNESS,
            max_zero_angle_count: MAX_ZERO_ANGLE_COUNT,
        }
    }
}
