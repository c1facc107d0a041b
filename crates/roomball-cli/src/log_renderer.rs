use roomball_core::{Renderer, Vector3};
use roomball_world::to_z_up;

/// A renderer that writes the scene to the log instead of drawing it.
///
/// Positions are reported both in room coordinates and in the z-up convention of a
/// 3D scene graph.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frame: u64,
    ball: Option<Vector3>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frame
    }
}

impl Renderer for LogRenderer {
    fn set_ball_position(&mut self, position: Vector3) {
        self.ball = Some(position);
    }

    fn set_marker_position(&mut self, position: Vector3) {
        self.frame += 1;
        let Some(ball) = self.ball.take() else {
            log::trace!("Marker at {:?} without a ball", position);
            return;
        };
        tracing::trace!(
            frame = self.frame,
            ball = ?ball.as_slice(),
            ball_z_up = ?to_z_up(ball).as_slice(),
            marker = ?position.as_slice(),
            marker_z_up = ?to_z_up(position).as_slice(),
            "render"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_frames() {
        let mut renderer = LogRenderer::new();
        for _ in 0..3 {
            renderer.set_ball_position(Vector3::new(1.0, 2.0, 3.0));
            renderer.set_marker_position(Vector3::zeros());
        }
        assert_eq!(renderer.frames(), 3);
    }
}
