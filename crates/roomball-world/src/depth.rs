//! Per-pixel relative depth images and their conversion into detection samples.
//!
//! Monocular depth estimators produce relative inverse depth: larger values are
//! nearer, and the scale changes from frame to frame. Each map is therefore rescaled
//! so that its nearest pixel is `1` and its farthest `0` before it is sampled.

use anyhow::{ensure, Result};
use roomball_core::{clamp_pixel, DetectionSample, Landmark};

/// A row-major depth image.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl DepthMap {
    /// Create a depth map from row-major values.
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "Depth map must not be empty");
        ensure!(
            values.len() == width as usize * height as usize,
            "Depth map of {}x{} needs {} values, got {}",
            width,
            height,
            width as usize * height as usize,
            values.len()
        );
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// Create a depth map by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Result<Self> {
        let mut values = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self::new(width, height, values)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Value at the given pixel, which must lie inside the map.
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Rescale the map linearly so that its minimum becomes `0` and its maximum `1`.
    ///
    /// Non-finite values are ignored when looking for the range and become `0`. A map
    /// without any spread becomes all zeros.
    pub fn normalized(&self) -> DepthMap {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;

        let values = self
            .values
            .iter()
            .map(|&v| {
                if !v.is_finite() || range <= 0.0 {
                    0.0
                } else {
                    ((v - min) / range).clamp(0.0, 1.0)
                }
            })
            .collect();

        DepthMap {
            width: self.width,
            height: self.height,
            values,
        }
    }

    /// Look up the value under a pixel, clamping the pixel into the map first.
    pub fn sample(&self, x: i32, y: i32) -> f32 {
        match clamp_pixel(x, y, self.width, self.height) {
            Some((x, y)) => self.get(x, y).unwrap_or(0.0),
            None => 0.0,
        }
    }
}

/// Build a detection sample from a wrist landmark and the raw depth map of the same
/// frame.
///
/// The landmark is mirrored first if the camera image was flipped for a selfie view.
/// The depth map is normalized and sampled at the landmark pixel, clamped into the
/// frame. Returns `None` when there is no landmark.
pub fn detection_from_landmark(
    landmark: Option<Landmark>,
    depth_map: &DepthMap,
    mirror: bool,
) -> Option<DetectionSample> {
    let landmark = landmark?;
    let landmark = if mirror {
        landmark.mirrored()
    } else {
        landmark
    };

    let (width, height) = (depth_map.width(), depth_map.height());
    let (pixel_x, pixel_y) = landmark.to_pixel(width, height);
    let depth = depth_map.normalized().sample(pixel_x, pixel_y);

    Some(DetectionSample {
        pixel_x,
        pixel_y,
        depth: depth as f64,
        frame_width: width,
        frame_height: height,
    })
}
