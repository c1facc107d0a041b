use serde::Serialize;

use crate::Vector3;

/// Counters accumulated by the scheduler since it was started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Number of frames pushed to the renderer
    pub frames: u64,
    /// Frames in which a fresh detection moved the marker
    pub detection_hits: u64,
    /// Frames in which the marker stayed frozen
    pub detection_misses: u64,
    /// Frames skipped because the measured `dt` was not positive
    pub skipped_steps: u64,
    /// Number of wall reflections, counted per axis
    pub bounces: u64,
}

impl FrameStats {
    /// Fraction of frames with a fresh detection, in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.detection_hits + self.detection_misses;
        if total == 0 {
            0.0
        } else {
            self.detection_hits as f64 / total as f64
        }
    }
}

/// Everything that happened in a single frame, broadcast to subscribers after the
/// renderer has been updated.
#[derive(Clone, Debug, Serialize)]
pub struct FrameUpdate {
    /// Sequence number of the frame, starting at 1
    pub frame: u64,
    /// The time step that was integrated, in seconds
    pub dt: f64,
    pub ball_position: Vector3,
    pub ball_velocity: Vector3,
    pub marker_position: Vector3,
    /// Whether the marker was moved by a fresh detection in this frame
    pub detection_hit: bool,
    pub stats: FrameStats,
}
