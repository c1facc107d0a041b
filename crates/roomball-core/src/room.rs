use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::Vector3;

/// The axis-aligned box that bounds every position handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomVolume {
    pub min_x: f64,
    pub max_x: f64,
    /// Floor
    pub min_y: f64,
    /// Ceiling
    pub max_y: f64,
    /// Closest to the viewer
    pub min_z: f64,
    pub max_z: f64,
}

impl RoomVolume {
    pub fn new(min: Vector3, max: Vector3) -> Self {
        Self {
            min_x: min.x,
            max_x: max.x,
            min_y: min.y,
            max_y: max.y,
            min_z: min.z,
            max_z: max.z,
        }
    }

    /// The corner with the smallest coordinate on every axis.
    pub fn min(&self) -> Vector3 {
        Vector3::new(self.min_x, self.min_y, self.min_z)
    }

    /// The corner with the largest coordinate on every axis.
    pub fn max(&self) -> Vector3 {
        Vector3::new(self.max_x, self.max_y, self.max_z)
    }

    /// Size of the room along each axis.
    pub fn extent(&self) -> Vector3 {
        self.max() - self.min()
    }

    pub fn center(&self) -> Vector3 {
        (self.min() + self.max()) / 2.0
    }

    /// Whether the point lies inside the room, boundary included.
    pub fn contains(&self, point: &Vector3) -> bool {
        (0..3).all(|axis| {
            point[axis] >= self.min()[axis] && point[axis] <= self.max()[axis]
        })
    }

    /// Clamp the point onto the room, axis by axis.
    pub fn clamp(&self, point: &Vector3) -> Vector3 {
        let (min, max) = (self.min(), self.max());
        Vector3::new(
            point.x.clamp(min.x, max.x),
            point.y.clamp(min.y, max.y),
            point.z.clamp(min.z, max.z),
        )
    }

    /// Check that the bounds are finite and that `min < max` on every axis.
    ///
    /// A room that fails this check must not be simulated.
    pub fn validate(&self) -> Result<()> {
        for (name, min, max) in [
            ("x", self.min_x, self.max_x),
            ("y", self.min_y, self.max_y),
            ("z", self.min_z, self.max_z),
        ] {
            if !min.is_finite() || !max.is_finite() {
                bail!("Room bounds on the {name} axis are not finite: [{min}, {max}]");
            }
            if min >= max {
                bail!("Room min_{name} ({min}) must be smaller than max_{name} ({max})");
            }
        }
        Ok(())
    }
}

impl Default for RoomVolume {
    fn default() -> Self {
        Self {
            min_x: -200.0,
            max_x: 200.0,
            min_y: 0.0,
            max_y: 200.0,
            min_z: 0.0,
            max_z: 600.0,
        }
    }
}
