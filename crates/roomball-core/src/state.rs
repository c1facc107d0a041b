use serde::{Deserialize, Serialize};

use crate::Vector3;

/// State of the bouncing ball.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    /// Position in room coordinates
    pub position: Vector3,
    /// Velocity in room units per second
    pub velocity: Vector3,
}

impl BallState {
    pub fn new(position: Vector3, velocity: Vector3) -> Self {
        Self { position, velocity }
    }
}

/// Last known position of the hand-tracked marker.
///
/// The position is only ever replaced by a freshly mapped value. A failed detection
/// leaves it where it was.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerState {
    position: Vector3,
}

impl MarkerState {
    pub fn new(position: Vector3) -> Self {
        Self { position }
    }

    pub fn position(&self) -> Vector3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }
}
