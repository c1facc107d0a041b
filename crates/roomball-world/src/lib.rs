use anyhow::Result;
use roomball_core::{
    BallState, DetectionSample, MarkerState, RoomVolume, RoomballSettings, Vector3,
};

mod ball;
mod coord_utils;
mod depth;

pub use ball::{step_ball, BallPhysics, Bounces};
pub use coord_utils::{is_usable, sample_to_room_coords, to_room_coords, to_z_up};
pub use depth::{detection_from_landmark, DepthMap};

/// A struct to track the state of the room: the bouncing ball and the hand-tracked
/// marker.
#[derive(Debug)]
pub struct WorldTracker {
    room: RoomVolume,
    ball: BallPhysics,
    marker: MarkerState,
}

impl WorldTracker {
    /// Create a new world tracker from the settings.
    ///
    /// Fails if the settings are invalid. Start positions outside the room are clamped
    /// onto it.
    pub fn new(settings: &RoomballSettings) -> Result<Self> {
        settings.validate()?;
        let room = settings.room;

        let mut ball = settings.ball.initial_state();
        ball.position = room.clamp(&ball.position);
        let marker = MarkerState::new(room.clamp(&settings.marker.initial_state().position()));

        Ok(Self {
            room,
            ball: BallPhysics::new(ball),
            marker,
        })
    }

    pub fn room(&self) -> &RoomVolume {
        &self.room
    }

    pub fn ball(&self) -> &BallState {
        self.ball.state()
    }

    pub fn marker(&self) -> &MarkerState {
        &self.marker
    }

    /// Advance the ball by `dt` seconds.
    pub fn update_ball(&mut self, dt: f64) -> Bounces {
        self.ball.step(dt, &self.room)
    }

    /// Move the marker to the position of a fresh detection.
    ///
    /// Without a usable sample the marker keeps its last position. Returns whether the
    /// marker was updated from the sample.
    pub fn update_marker(&mut self, sample: Option<&DetectionSample>) -> bool {
        let updated = sample.map_or(false, |s| is_usable(s, s.frame_width, s.frame_height));
        if updated {
            let previous = self.marker.position();
            self.marker
                .set_position(sample_to_room_coords(sample, previous, &self.room));
        }
        updated
    }

    pub fn ball_position(&self) -> Vector3 {
        self.ball.state().position
    }

    pub fn marker_position(&self) -> Vector3 {
        self.marker.position()
    }
}
