//! Interfaces for the collaborators around the frame pipeline.
//!
//! The pipeline needs two things from the outside world: something that turns camera
//! frames into [`DetectionSample`]s, and something that displays the resulting
//! positions. Neither is implemented here.
//!
//! A detector may be slow (neural network inference) and may fail on any given frame.
//! The scheduler never waits on it for longer than one pass of
//! [`Detector::capture_and_detect`], and may run it on a separate thread:
//!
//! ```no_run
//! use roomball_core::{DetectionSample, Detector};
//!
//! struct NoHands;
//!
//! impl Detector for NoHands {
//!     fn capture_and_detect(&mut self) -> Option<DetectionSample> {
//!         None
//!     }
//! }
//! ```

use crate::{DetectionSample, Vector3};

/// Source of hand tracking samples.
pub trait Detector: Send {
    /// Grab the next frame and locate the tracked landmark in it.
    ///
    /// Returns `None` if no frame could be captured or no hand was found. This is
    /// not an error: the marker keeps its last position.
    fn capture_and_detect(&mut self) -> Option<DetectionSample>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn capture_and_detect(&mut self) -> Option<DetectionSample> {
        (**self).capture_and_detect()
    }
}

/// Sink for the positions produced every frame.
pub trait Renderer: Send {
    /// Move the ball to the given room coordinates.
    fn set_ball_position(&mut self, position: Vector3);

    /// Move the marker to the given room coordinates.
    fn set_marker_position(&mut self, position: Vector3);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn set_ball_position(&mut self, position: Vector3) {
        (**self).set_ball_position(position)
    }

    fn set_marker_position(&mut self, position: Vector3) {
        (**self).set_marker_position(position)
    }
}
