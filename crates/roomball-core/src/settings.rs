use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{BallState, MarkerState, RoomVolume, Vector3};

/// Initial conditions of the ball.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BallSettings {
    /// Start position in room coordinates.
    pub start_position: Vector3,
    /// Start velocity in room units per second.
    pub start_velocity: Vector3,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            start_position: Vector3::new(0.0, 150.0, 400.0),
            start_velocity: Vector3::new(50.0, -30.0, 40.0),
        }
    }
}

impl BallSettings {
    pub fn initial_state(&self) -> BallState {
        BallState::new(self.start_position, self.start_velocity)
    }
}

/// Initial conditions of the hand-tracked marker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerSettings {
    /// Where the marker sits until the first hand is detected.
    pub start_position: Vector3,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            start_position: Vector3::new(0.0, 100.0, 100.0),
        }
    }
}

impl MarkerSettings {
    pub fn initial_state(&self) -> MarkerState {
        MarkerState::new(self.start_position)
    }
}

/// Settings for the frame loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Target number of rendered frames per second.
    pub target_fps: f64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { target_fps: 30.0 }
    }
}

impl SchedulerSettings {
    /// Time between two frames at the target frame rate.
    ///
    /// Fails if the rate is not positive or the interval is not representable as a
    /// non-zero [`Duration`].
    pub fn frame_interval(&self) -> Result<Duration> {
        let fps = self.target_fps;
        if !fps.is_finite() || fps <= 0.0 {
            bail!("Target frame rate must be positive, got {fps}");
        }
        match Duration::try_from_secs_f64(1.0 / fps) {
            Ok(interval) if !interval.is_zero() => Ok(interval),
            _ => bail!("Target frame rate {fps} gives no usable frame interval"),
        }
    }
}

/// All static configuration, loaded once at startup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoomballSettings {
    #[serde(default)]
    pub room: RoomVolume,
    #[serde(default)]
    pub ball: BallSettings,
    #[serde(default)]
    pub marker: MarkerSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

impl RoomballSettings {
    /// Check the settings for values that would make the simulation undefined.
    ///
    /// Start positions outside the room are allowed. They are clamped onto the room
    /// before the first frame.
    pub fn validate(&self) -> Result<()> {
        self.room.validate().context("Invalid room volume")?;

        self.scheduler.frame_interval()?;

        let vectors = [
            ("ball.start_position", self.ball.start_position),
            ("ball.start_velocity", self.ball.start_velocity),
            ("marker.start_position", self.marker.start_position),
        ];
        for (name, value) in vectors {
            if value.iter().any(|c| !c.is_finite()) {
                bail!("{name} must be finite, got {value:?}");
            }
        }
        for (name, value) in [
            ("ball.start_position", self.ball.start_position),
            ("marker.start_position", self.marker.start_position),
        ] {
            if !self.room.contains(&value) {
                log::warn!("{name} {value:?} lies outside the room and will be clamped");
            }
        }

        Ok(())
    }

    /// Load the settings from a JSON file, or store the default settings if the file
    /// does not exist.
    pub fn load_or_insert(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings file {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.store(path)?;
                log::info!("Wrote default settings to {}", path.display());
                Ok(settings)
            }
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read settings file {}", path.display())),
        }
    }

    /// Store the settings in the given file.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write settings file {}", path.display()))
    }
}
