use serde::{Deserialize, Serialize};

/// One frame's worth of hand tracking: the landmark pixel and the normalized depth
/// under it.
///
/// A frame without a usable hand is represented as `None` by the producer, not by a
/// sentinel sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionSample {
    /// Pixel column of the landmark. May lie outside the frame near its edges.
    pub pixel_x: i32,
    /// Pixel row of the landmark, growing downwards. May lie outside the frame.
    pub pixel_y: i32,
    /// Normalized depth in `[0, 1]`, where `1` is the nearest point in the frame and
    /// `0` the farthest.
    pub depth: f64,
    /// Width of the frame the landmark was detected in, in pixels
    pub frame_width: u32,
    /// Height of the frame the landmark was detected in, in pixels
    pub frame_height: u32,
}

impl DetectionSample {
    /// The landmark pixel clamped into the frame, suitable for indexing a per-pixel
    /// depth map of the same size.
    ///
    /// Returns `None` for an empty frame.
    pub fn clamped_pixel(&self) -> Option<(u32, u32)> {
        clamp_pixel(
            self.pixel_x,
            self.pixel_y,
            self.frame_width,
            self.frame_height,
        )
    }
}

/// Clamp a pixel to `[0, width - 1] x [0, height - 1]`.
pub fn clamp_pixel(x: i32, y: i32, width: u32, height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let x = (x.max(0) as u32).min(width - 1);
    let y = (y.max(0) as u32).min(height - 1);
    Some((x, y))
}

/// A 2D landmark as reported by a hand detector, in normalized image coordinates.
///
/// `(0, 0)` is the top left corner of the frame and `(1, 1)` the bottom right.
/// Detectors may report values slightly outside this range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Mirror the landmark horizontally, as a selfie-view camera flip does.
    pub fn mirrored(&self) -> Self {
        Self {
            x: 1.0 - self.x,
            y: self.y,
        }
    }

    /// Convert to pixel coordinates in a frame of the given size.
    ///
    /// The result is not clamped.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            (self.x * width as f64).floor() as i32,
            (self.y * height as f64).floor() as i32,
        )
    }
}
