use std::{
    f64::consts::TAU,
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use roomball_core::{DetectionSample, Detector, Landmark};
use roomball_world::{detection_from_landmark, DepthMap};

/// Relative inverse depth of the back wall and of the hand, before normalization.
const BACKGROUND_DEPTH: f32 = 2.0;
const HAND_DEPTH: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct MockDetectorConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Probability of a frame without a hand, in `[0, 1]`.
    pub miss_rate: f64,
    /// Time a single capture and detection pass takes.
    pub latency: Duration,
    /// Flip the camera image horizontally before detection.
    pub mirror: bool,
}

/// A detector for running without a camera.
///
/// A synthetic wrist moves along a Lissajous curve in front of a flat back wall while
/// periodically reaching towards the camera. Each pass renders a depth map for the
/// current pose and runs it through the same landmark to sample path a real detector
/// would use.
pub struct MockDetector {
    config: MockDetectorConfig,
    started: Instant,
    rng: StdRng,
}

impl MockDetector {
    pub fn new(config: MockDetectorConfig) -> Self {
        Self {
            config,
            started: Instant::now(),
            rng: StdRng::from_entropy(),
        }
    }

    /// The wrist position at `t` seconds, in normalized camera coordinates.
    pub fn wrist_at(t: f64) -> Landmark {
        Landmark::new(
            0.5 + 0.4 * (TAU * 0.11 * t).sin(),
            0.5 + 0.35 * (TAU * 0.17 * t).sin(),
        )
    }

    /// How far the hand reaches towards the camera at `t` seconds, in `[0, 1]`.
    pub fn reach_at(t: f64) -> f32 {
        (0.5 + 0.5 * (TAU * 0.05 * t).sin()) as f32
    }

    /// Render the depth map a depth estimator would produce for the wrist at
    /// `wrist`, in the orientation of the (possibly mirrored) camera image.
    pub fn render_depth(&self, wrist: Landmark, reach: f32) -> Result<DepthMap> {
        let (width, height) = (self.config.frame_width, self.config.frame_height);
        let (wx, wy) = wrist.to_pixel(width, height);
        let radius = (width.min(height) as f32 / 10.0).max(1.0);
        DepthMap::from_fn(width, height, |x, y| {
            // The floor gets closer towards the bottom of the image
            let floor = y as f32 / height as f32;
            let dx = x as f32 - wx as f32;
            let dy = y as f32 - wy as f32;
            let falloff = (-(dx * dx + dy * dy) / (radius * radius)).exp();
            BACKGROUND_DEPTH + floor + falloff * HAND_DEPTH * reach
        })
    }
}

impl Detector for MockDetector {
    fn capture_and_detect(&mut self) -> Option<DetectionSample> {
        thread::sleep(self.config.latency);
        if self.rng.gen_bool(self.config.miss_rate.clamp(0.0, 1.0)) {
            return None;
        }

        let t = self.started.elapsed().as_secs_f64();
        let wrist = Self::wrist_at(t);
        // The detector sees the flipped image, so the hand is drawn where it appears
        // after flipping and the landmark is reported in camera coordinates.
        let seen = if self.config.mirror {
            wrist.mirrored()
        } else {
            wrist
        };
        let depth_map = match self.render_depth(seen, Self::reach_at(t)) {
            Ok(map) => map,
            Err(err) => {
                log::warn!("Failed to render mock depth map: {}", err);
                return None;
            }
        };
        detection_from_landmark(Some(wrist), &depth_map, self.config.mirror)
    }
}

/// A detector that never sees a hand. The marker stays at its start position.
pub struct NoHandsDetector;

impl Detector for NoHandsDetector {
    fn capture_and_detect(&mut self) -> Option<DetectionSample> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(miss_rate: f64, mirror: bool) -> MockDetectorConfig {
        MockDetectorConfig {
            frame_width: 64,
            frame_height: 48,
            miss_rate,
            latency: Duration::ZERO,
            mirror,
        }
    }

    #[test]
    fn test_wrist_stays_in_frame() {
        for i in 0..1000 {
            let wrist = MockDetector::wrist_at(i as f64 * 0.1);
            assert!((0.0..=1.0).contains(&wrist.x));
            assert!((0.0..=1.0).contains(&wrist.y));
        }
    }

    #[test]
    fn test_sample_lies_on_the_hand() {
        for mirror in [false, true] {
            let mut detector = MockDetector::new(config(0.0, mirror));
            let sample = detector.capture_and_detect().unwrap();
            assert_eq!((sample.frame_width, sample.frame_height), (64, 48));
            assert!((0..64).contains(&sample.pixel_x));
            assert!((0..48).contains(&sample.pixel_y));
            assert!((0.0..=1.0).contains(&sample.depth));
        }
    }

    #[test]
    fn test_hand_is_nearest_when_reaching() {
        let detector = MockDetector::new(config(0.0, false));
        let wrist = Landmark::new(0.5, 0.5);
        let map = detector.render_depth(wrist, 1.0).unwrap();
        let sample = detection_from_landmark(Some(wrist), &map, false).unwrap();
        approx::assert_relative_eq!(sample.depth, 1.0);
    }

    #[test]
    fn test_full_miss_rate() {
        let mut detector = MockDetector::new(config(1.0, false));
        assert!((0..20).all(|_| detector.capture_and_detect().is_none()));
        assert!(NoHandsDetector.capture_and_detect().is_none());
    }
}
