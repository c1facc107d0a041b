use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use roomball_core::{
    DetectionSample, Detector, FrameStats, FrameUpdate, Renderer, RoomballSettings,
};
use roomball_world::WorldTracker;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

mod detection_task;
mod handle;

pub use detection_task::DetectionTask;
pub use handle::{ControlMsg, SchedulerHandle, SchedulerInfo, SchedulerInfoReceiver};

/// Where the scheduler gets its detection samples from.
enum DetectionSource {
    /// The detector is called on the frame loop, once per frame.
    Inline(Box<dyn Detector>),
    /// The detector runs on its own thread; the frame loop takes its latest result.
    Background(DetectionTask),
}

impl DetectionSource {
    fn next_sample(&mut self) -> Option<DetectionSample> {
        match self {
            DetectionSource::Inline(detector) => detector.capture_and_detect(),
            DetectionSource::Background(task) => task.take_latest(),
        }
    }
}

/// The frame loop. Every frame it advances the ball, takes the latest detection, maps
/// it onto the marker and pushes both positions to the renderer.
///
/// The scheduler can be driven externally, one frame at a time with [`step`] or
/// [`tick`], or run in real time at the target frame rate with [`run_real_time`].
///
/// [`step`]: FrameScheduler::step
/// [`tick`]: FrameScheduler::tick
/// [`run_real_time`]: FrameScheduler::run_real_time
pub struct FrameScheduler {
    tracker: WorldTracker,
    detection: Option<DetectionSource>,
    renderer: Box<dyn Renderer>,
    target_fps: f64,
    frame_interval: Duration,
    last_tick: Option<Instant>,
    stats: FrameStats,
    update_tx: broadcast::Sender<FrameUpdate>,
    command_tx: mpsc::UnboundedSender<ControlMsg>,
    command_rx: mpsc::UnboundedReceiver<ControlMsg>,
    info_tx: mpsc::UnboundedSender<oneshot::Sender<SchedulerInfo>>,
    info_rx: mpsc::UnboundedReceiver<oneshot::Sender<SchedulerInfo>>,
    paused_tx: watch::Sender<bool>,
}

#[derive(Default)]
pub struct FrameSchedulerBuilder {
    settings: Option<RoomballSettings>,
    detector: Option<Box<dyn Detector>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl FrameSchedulerBuilder {
    pub fn with_settings(&mut self, settings: RoomballSettings) -> &mut Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_detector(&mut self, detector: Box<dyn Detector>) -> &mut Self {
        self.detector = Some(detector);
        self
    }

    pub fn with_renderer(&mut self, renderer: Box<dyn Renderer>) -> &mut Self {
        self.renderer = Some(renderer);
        self
    }

    /// Build the scheduler.
    ///
    /// Fails if a collaborator is missing or the settings are invalid.
    pub fn build(&mut self) -> Result<FrameScheduler> {
        let settings = self.settings.take().unwrap_or_default();
        let Some(detector) = self.detector.take() else {
            bail!("Detector not set");
        };
        let Some(renderer) = self.renderer.take() else {
            bail!("Renderer not set");
        };
        FrameScheduler::new(settings, detector, renderer)
    }
}

impl FrameScheduler {
    pub fn builder() -> FrameSchedulerBuilder {
        FrameSchedulerBuilder::default()
    }

    pub fn new(
        settings: RoomballSettings,
        detector: Box<dyn Detector>,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self> {
        let tracker = WorldTracker::new(&settings)?;
        let frame_interval = settings.scheduler.frame_interval()?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (info_tx, info_rx) = mpsc::unbounded_channel();
        let (update_tx, _) = broadcast::channel(16);
        let (paused_tx, _) = watch::channel(false);

        Ok(Self {
            tracker,
            detection: Some(DetectionSource::Inline(detector)),
            renderer,
            target_fps: settings.scheduler.target_fps,
            frame_interval,
            last_tick: None,
            stats: FrameStats::default(),
            update_tx,
            command_tx,
            command_rx,
            info_tx,
            info_rx,
            paused_tx,
        })
    }

    pub fn tracker(&self) -> &WorldTracker {
        &self.tracker
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    pub fn is_paused(&self) -> bool {
        *self.paused_tx.borrow()
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            control_tx: self.command_tx.clone(),
            update_rx: self.update_tx.subscribe(),
            info_channel: self.info_tx.clone(),
        }
    }

    /// Subscribe to the updates produced after every frame.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameUpdate> {
        self.update_tx.subscribe()
    }

    /// Run a single frame with an explicit time step.
    ///
    /// The whole frame completes before this returns: the ball and the marker are
    /// never observed half updated.
    pub fn step(&mut self, dt: f64) -> FrameUpdate {
        if dt.is_finite() && dt > 0.0 {
            let bounces = self.tracker.update_ball(dt);
            self.stats.bounces += bounces.count();
        } else {
            log::trace!("Skipping physics for dt {}", dt);
            self.stats.skipped_steps += 1;
        }

        let sample = self.detection.as_mut().and_then(|d| d.next_sample());
        let detection_hit = self.tracker.update_marker(sample.as_ref());
        if detection_hit {
            self.stats.detection_hits += 1;
        } else {
            log::debug!("No detection in frame {}, marker stays frozen", self.stats.frames + 1);
            self.stats.detection_misses += 1;
        }

        let ball_position = self.tracker.ball_position();
        let marker_position = self.tracker.marker_position();
        self.renderer.set_ball_position(ball_position);
        self.renderer.set_marker_position(marker_position);
        self.stats.frames += 1;

        let update = FrameUpdate {
            frame: self.stats.frames,
            dt,
            ball_position,
            ball_velocity: self.tracker.ball().velocity,
            marker_position,
            detection_hit,
            stats: self.stats,
        };
        // Nobody listening is fine
        let _ = self.update_tx.send(update.clone());
        update
    }

    /// Run a single frame, measuring the time step since the previous tick.
    ///
    /// The first tick after construction or a pause integrates nothing.
    pub fn tick(&mut self) -> FrameUpdate {
        let now = Instant::now();
        let dt = self
            .last_tick
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.step(dt)
    }

    /// Run the frame loop in real time at the target frame rate until a stop signal
    /// arrives on `stop_rx` or a [`ControlMsg::Stop`] is received.
    ///
    /// The detector is moved onto its own thread so a slow detection pass never
    /// delays a frame. Stopping always happens between two frames.
    pub async fn run_real_time(mut self, mut stop_rx: broadcast::Receiver<()>) -> Result<()> {
        let detection = match self.detection.take() {
            Some(DetectionSource::Inline(detector)) => {
                DetectionSource::Background(DetectionTask::spawn(detector, self.frame_interval)?)
            }
            Some(source) => source,
            None => bail!("Detector not set"),
        };
        self.detection = Some(detection);

        log::info!("Starting frame loop at {} fps", self.target_fps);
        let mut frame_interval = tokio::time::interval(self.frame_interval);
        frame_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Control messages go first so a pause takes effect before the next frame
                biased;
                _ = stop_rx.recv() => break,
                Some(msg) = self.command_rx.recv() => {
                    match msg {
                        ControlMsg::Stop => break,
                        msg => self.handle_control_msg(msg),
                    }
                }
                Some(reply) = self.info_rx.recv() => {
                    reply.send(self.info()).ok();
                }
                _ = frame_interval.tick() => {
                    if !self.is_paused() {
                        self.tick();
                    }
                }
            }
        }

        log::info!(
            "Frame loop stopped after {} frames ({:.0}% detection hits)",
            self.stats.frames,
            self.stats.hit_rate() * 100.0
        );
        Ok(())
    }

    fn info(&self) -> SchedulerInfo {
        SchedulerInfo {
            paused: self.is_paused(),
            stats: self.stats,
            target_fps: self.target_fps,
        }
    }

    fn handle_control_msg(&mut self, msg: ControlMsg) {
        match msg {
            ControlMsg::SetPause(pause) => {
                if pause != self.is_paused() {
                    log::info!("{} frame loop", if pause { "Pausing" } else { "Resuming" });
                }
                // Restart dt measurement so the ball does not jump on resume
                self.last_tick = None;
                self.paused_tx.send_replace(pause);
            }
            ControlMsg::Stop => {}
        }
    }
}
