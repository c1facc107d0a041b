use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use approx::assert_relative_eq;
use nalgebra::Vector3;
use roomball_core::{DetectionSample, Detector, Renderer, RoomballSettings};
use roomball_executor::{ControlMsg, FrameScheduler};
use tokio::sync::broadcast;

/// A detector that takes far longer than a frame for each pass.
struct SlowDetector {
    latency: Duration,
}

impl Detector for SlowDetector {
    fn capture_and_detect(&mut self) -> Option<DetectionSample> {
        thread::sleep(self.latency);
        Some(DetectionSample {
            pixel_x: 640,
            pixel_y: 480,
            depth: 0.0,
            frame_width: 640,
            frame_height: 480,
        })
    }
}

#[derive(Clone, Default)]
struct SharedRenderer {
    ball: Arc<Mutex<Vec<Vector3<f64>>>>,
    marker: Arc<Mutex<Vec<Vector3<f64>>>>,
}

impl Renderer for SharedRenderer {
    fn set_ball_position(&mut self, position: Vector3<f64>) {
        self.ball.lock().unwrap().push(position);
    }

    fn set_marker_position(&mut self, position: Vector3<f64>) {
        self.marker.lock().unwrap().push(position);
    }
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 2))]
async fn slow_detection_does_not_block_frames() {
    let mut settings = RoomballSettings::default();
    settings.scheduler.target_fps = 50.0;
    let start_marker = settings.marker.start_position;
    let room = settings.room;

    let renderer = SharedRenderer::default();
    let scheduler = FrameScheduler::builder()
        .with_settings(settings)
        .with_detector(Box::new(SlowDetector {
            latency: Duration::from_millis(300),
        }))
        .with_renderer(Box::new(renderer.clone()))
        .build()
        .unwrap();
    let mut handle = scheduler.handle();
    let (_stop_tx, stop_rx) = broadcast::channel(1);
    let task = tokio::spawn(scheduler.run_real_time(stop_rx));

    // Frames keep coming while the first detection pass is still running
    let mut frozen_frames = 0;
    loop {
        let update = handle.recv().await.unwrap();
        if update.detection_hit {
            assert_relative_eq!(update.marker_position, Vector3::new(200.0, 0.0, 600.0));
            break;
        }
        assert_eq!(update.marker_position, start_marker);
        frozen_frames += 1;
    }
    assert!(frozen_frames >= 5, "only {frozen_frames} frames before detection");

    handle.send(ControlMsg::Stop);
    task.await.unwrap().unwrap();

    let balls = renderer.ball.lock().unwrap();
    let markers = renderer.marker.lock().unwrap();
    assert_eq!(balls.len(), markers.len());
    assert!(balls.iter().all(|p| room.contains(p)));
    assert!(markers.iter().all(|p| room.contains(p)));
}

#[test]
fn long_run_stays_inside_room() {
    let settings = RoomballSettings::default();
    let room = settings.room;
    let renderer = SharedRenderer::default();
    let mut scheduler = FrameScheduler::builder()
        .with_settings(settings)
        .with_detector(Box::new(SlowDetector {
            latency: Duration::ZERO,
        }))
        .with_renderer(Box::new(renderer.clone()))
        .build()
        .unwrap();

    // Ten simulated minutes with a jittery frame time
    for i in 0..18_000 {
        let dt = if i % 7 == 0 { 0.1 } else { 1.0 / 30.0 };
        scheduler.step(dt);
    }

    let stats = scheduler.stats();
    assert_eq!(stats.frames, 18_000);
    assert_eq!(stats.detection_hits, 18_000);
    assert!(stats.bounces > 0);
    assert!(renderer.ball.lock().unwrap().iter().all(|p| room.contains(p)));

    // Elastic walls keep the speed on every axis
    let velocity = scheduler.tracker().ball().velocity;
    assert_eq!(velocity.map(f64::abs), Vector3::new(50.0, 30.0, 40.0));
}
