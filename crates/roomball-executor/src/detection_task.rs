use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use roomball_core::{DetectionSample, Detector};
use tokio::sync::watch;

/// Runs a [`Detector`] on its own thread and keeps only its most recent result.
///
/// The worker publishes one value per completed detection pass into a single-slot
/// cell. The frame loop picks up the value without ever waiting for it; a value is
/// handed out at most once, so frames between two passes see no sample and the marker
/// stays where it is.
pub struct DetectionTask {
    latest_rx: watch::Receiver<Option<DetectionSample>>,
    worker_gone: bool,
}

impl DetectionTask {
    /// Start the detection worker.
    ///
    /// Passes that finish faster than `min_interval` are padded so the worker does not
    /// outrun the frame loop. The worker exits after its current pass once the task is
    /// dropped.
    pub fn spawn(mut detector: Box<dyn Detector>, min_interval: Duration) -> Result<Self> {
        let (latest_tx, latest_rx) = watch::channel(None);
        thread::Builder::new()
            .name("detection".to_string())
            .spawn(move || {
                loop {
                    let started = Instant::now();
                    let sample = detector.capture_and_detect();
                    if latest_tx.send(sample).is_err() {
                        break;
                    }
                    if let Some(rest) = min_interval.checked_sub(started.elapsed()) {
                        thread::sleep(rest);
                    }
                }
                log::debug!("Detection worker stopped");
            })
            .context("Failed to spawn detection thread")?;

        Ok(Self {
            latest_rx,
            worker_gone: false,
        })
    }

    /// Take the result of the latest detection pass, if one completed since the last
    /// call.
    pub fn take_latest(&mut self) -> Option<DetectionSample> {
        {
            // Still readable after the worker is gone, so its last pass is not lost
            let latest = self.latest_rx.borrow_and_update();
            if latest.has_changed() {
                return *latest;
            }
        }
        if self.latest_rx.has_changed().is_err() && !self.worker_gone {
            log::warn!("Detection worker died, the marker will stay frozen");
            self.worker_gone = true;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    struct CountingDetector {
        passes: Arc<AtomicU32>,
    }

    impl Detector for CountingDetector {
        fn capture_and_detect(&mut self) -> Option<DetectionSample> {
            let n = self.passes.fetch_add(1, Ordering::SeqCst) as i32;
            Some(DetectionSample {
                pixel_x: n,
                pixel_y: 0,
                depth: 0.5,
                frame_width: 640,
                frame_height: 480,
            })
        }
    }

    struct PanickingDetector;

    /// Reports one hand, then fails on the next pass.
    struct OneShotDetector {
        done: bool,
    }

    impl Detector for OneShotDetector {
        fn capture_and_detect(&mut self) -> Option<DetectionSample> {
            if self.done {
                panic!("camera unplugged");
            }
            self.done = true;
            Some(DetectionSample {
                pixel_x: 7,
                pixel_y: 0,
                depth: 0.5,
                frame_width: 640,
                frame_height: 480,
            })
        }
    }

    impl Detector for PanickingDetector {
        fn capture_and_detect(&mut self) -> Option<DetectionSample> {
            panic!("camera unplugged");
        }
    }

    fn wait_until(mut f: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !f() {
            assert!(Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_latest_sample_is_taken_once() {
        let passes = Arc::new(AtomicU32::new(0));
        let detector = CountingDetector {
            passes: passes.clone(),
        };
        let mut task = DetectionTask::spawn(Box::new(detector), Duration::from_secs(60)).unwrap();

        let mut sample = None;
        wait_until(|| {
            sample = task.take_latest();
            sample.is_some()
        });
        assert_eq!(sample.unwrap().pixel_x, 0);

        // The worker is asleep until the next pass, so nothing new is available
        assert!(task.take_latest().is_none());
        assert_eq!(passes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dead_worker_yields_none() {
        let mut task = DetectionTask::spawn(Box::new(PanickingDetector), Duration::ZERO).unwrap();
        wait_until(|| task.latest_rx.has_changed().is_err());

        assert!(task.take_latest().is_none());
        assert!(task.worker_gone);
        assert!(task.take_latest().is_none());
    }

    #[test]
    fn test_last_sample_survives_dead_worker() {
        let detector = OneShotDetector { done: false };
        let mut task = DetectionTask::spawn(Box::new(detector), Duration::ZERO).unwrap();
        wait_until(|| task.latest_rx.has_changed().is_err());

        assert_eq!(task.take_latest().map(|s| s.pixel_x), Some(7));
        assert!(task.take_latest().is_none());
        assert!(task.worker_gone);
    }
}
