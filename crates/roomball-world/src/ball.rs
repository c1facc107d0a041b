use roomball_core::{BallState, RoomVolume};

/// Which axes reflected off a wall during a single step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bounces {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Bounces {
    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }

    pub fn count(&self) -> u64 {
        [self.x, self.y, self.z].iter().filter(|b| **b).count() as u64
    }

    fn set(&mut self, axis: usize) {
        match axis {
            0 => self.x = true,
            1 => self.y = true,
            _ => self.z = true,
        }
    }
}

/// Integrate the ball over `dt` seconds and reflect it off the walls of the room.
///
/// Each axis is handled on its own: a position past a wall is clamped onto the wall
/// and the velocity on that axis is negated. A corner hit therefore reflects several
/// axes in the same step. No energy is lost.
///
/// A `dt` that is not positive (or not finite) leaves the state untouched.
pub fn step_ball(state: &mut BallState, dt: f64, room: &RoomVolume) -> Bounces {
    let mut bounces = Bounces::default();
    if !dt.is_finite() || dt <= 0.0 {
        log::trace!("Skipping ball step with dt = {}", dt);
        return bounces;
    }

    let (min, max) = (room.min(), room.max());
    for axis in 0..3 {
        state.position[axis] += state.velocity[axis] * dt;

        if state.position[axis] < min[axis] {
            state.position[axis] = min[axis];
            state.velocity[axis] = -state.velocity[axis];
            bounces.set(axis);
        } else if state.position[axis] > max[axis] {
            state.position[axis] = max[axis];
            state.velocity[axis] = -state.velocity[axis];
            bounces.set(axis);
        }
    }

    bounces
}

/// Point-mass physics for the ball.
#[derive(Debug)]
pub struct BallPhysics {
    state: BallState,
}

impl BallPhysics {
    pub fn new(state: BallState) -> BallPhysics {
        BallPhysics { state }
    }

    pub fn state(&self) -> &BallState {
        &self.state
    }

    /// Advance the ball by `dt` seconds inside `room`.
    pub fn step(&mut self, dt: f64, room: &RoomVolume) -> Bounces {
        let bounces = step_ball(&mut self.state, dt, room);
        if bounces.any() {
            log::debug!(
                "Ball bounced (x: {}, y: {}, z: {}) at {:?}",
                bounces.x,
                bounces.y,
                bounces.z,
                self.state.position
            );
        }
        bounces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;
    use roomball_core::Vector3;

    fn room() -> RoomVolume {
        RoomVolume::default()
    }

    fn ball(position: [f64; 3], velocity: [f64; 3]) -> BallState {
        BallState::new(Vector3::from(position), Vector3::from(velocity))
    }

    #[test]
    fn test_free_flight() {
        let mut state = ball([0.0, 150.0, 400.0], [50.0, -30.0, 40.0]);
        let bounces = step_ball(&mut state, 0.5, &room());

        assert!(!bounces.any());
        assert_relative_eq!(state.position, Vector3::new(25.0, 135.0, 420.0));
        assert_eq!(state.velocity, Vector3::new(50.0, -30.0, 40.0));
    }

    #[test]
    fn test_floor_reflection() {
        let mut state = ball([0.0, 5.0, 300.0], [0.0, -30.0, 0.0]);
        let bounces = step_ball(&mut state, 1.0, &room());

        assert_eq!(bounces, Bounces { x: false, y: true, z: false });
        assert_eq!(state.position.y, 0.0);
        assert_eq!(state.velocity.y, 30.0);
    }

    #[test]
    fn test_max_reflection_is_exact() {
        let mut state = ball([190.0, 100.0, 300.0], [40.0, 0.0, 0.0]);
        step_ball(&mut state, 1.0, &room());

        assert_eq!(state.position.x, 200.0);
        assert_eq!(state.velocity.x, -40.0);
    }

    #[test]
    fn test_corner_reflects_each_axis() {
        let mut state = ball([-195.0, 195.0, 595.0], [-10.0, 10.0, 10.0]);
        let bounces = step_ball(&mut state, 1.0, &room());

        assert_eq!(bounces.count(), 3);
        assert_eq!(state.position, Vector3::new(-200.0, 200.0, 600.0));
        assert_eq!(state.velocity, Vector3::new(10.0, -10.0, -10.0));
    }

    #[test]
    fn test_non_positive_dt_is_a_noop() {
        let initial = ball([1.5, 2.25, 3.125], [-7.0, 8.0, 9.0]);
        for dt in [0.0, -0.016, -1.0, f64::NAN, f64::INFINITY] {
            let mut state = initial;
            let bounces = step_ball(&mut state, dt, &room());
            assert!(!bounces.any());
            assert_eq!(state.position.map(f64::to_bits), initial.position.map(f64::to_bits));
            assert_eq!(state.velocity.map(f64::to_bits), initial.velocity.map(f64::to_bits));
        }
    }

    #[test]
    fn test_stays_inside_room() {
        let room = room();
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let position = Vector3::new(
                rng.gen_range(room.min_x..=room.max_x),
                rng.gen_range(room.min_y..=room.max_y),
                rng.gen_range(room.min_z..=room.max_z),
            );
            let velocity = Vector3::new(
                rng.gen_range(-5000.0..5000.0),
                rng.gen_range(-5000.0..5000.0),
                rng.gen_range(-5000.0..5000.0),
            );
            let mut state = BallState::new(position, velocity);
            let dt = rng.gen_range(1e-4..2.0);
            step_ball(&mut state, dt, &room);

            assert!(room.contains(&state.position), "{:?} escaped", state.position);
            for axis in 0..3 {
                assert_eq!(state.velocity[axis].abs(), velocity[axis].abs());
            }
        }
    }

    #[test]
    fn test_ball_physics_tracks_state() {
        let mut physics = BallPhysics::new(ball([0.0, 100.0, 300.0], [0.0, 0.0, -100.0]));
        for _ in 0..4 {
            physics.step(1.0, &room());
        }
        // 300 -> 200 -> 100 -> 0 (bounce) -> 100
        assert_eq!(physics.state().position.z, 100.0);
        assert_eq!(physics.state().velocity.z, 100.0);
    }
}
