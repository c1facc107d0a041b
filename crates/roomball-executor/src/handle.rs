use std::time::Duration;

use anyhow::{anyhow, Result};
use roomball_core::{FrameStats, FrameUpdate};
use tokio::sync::{broadcast, mpsc, oneshot};

#[derive(Debug)]
pub enum ControlMsg {
    /// Freeze the simulation. Detection keeps running in the background.
    SetPause(bool),
    /// Stop the frame loop after the current frame.
    Stop,
}

/// Runtime information about the active scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerInfo {
    pub paused: bool,
    pub stats: FrameStats,
    pub target_fps: f64,
}

pub struct SchedulerInfoReceiver(oneshot::Receiver<SchedulerInfo>);

impl SchedulerInfoReceiver {
    /// Wait for the scheduler info with a timeout of 500ms.
    ///
    /// If the timeout is reached, `None` is returned. This can happen if the scheduler
    /// is not running or stopped mid-request.
    pub async fn recv(self) -> Option<SchedulerInfo> {
        match tokio::time::timeout(Duration::from_millis(500), self.0).await {
            Ok(Ok(info)) => Some(info),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct SchedulerHandle {
    pub control_tx: mpsc::UnboundedSender<ControlMsg>,
    pub update_rx: broadcast::Receiver<FrameUpdate>,
    pub info_channel: mpsc::UnboundedSender<oneshot::Sender<SchedulerInfo>>,
}

impl SchedulerHandle {
    /// Wait for the next frame update.
    ///
    /// Returns `None` once the scheduler is gone. Updates missed because this handle
    /// fell behind are skipped.
    pub async fn recv(&mut self) -> Option<FrameUpdate> {
        loop {
            match self.update_rx.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::debug!("Frame update receiver lagged by {} frames", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn send(&self, msg: ControlMsg) {
        self.control_tx
            .send(msg)
            .map_err(|err| {
                log::error!("Error sending control message: {:?}", err);
            })
            .ok();
    }

    /// Request the current scheduler info.
    pub fn info(&self) -> Result<SchedulerInfoReceiver> {
        let (tx, rx) = oneshot::channel();
        self.info_channel
            .send(tx)
            .map_err(|err| anyhow!("Error sending info request: {:?}", err))?;
        Ok(SchedulerInfoReceiver(rx))
    }
}

impl Clone for SchedulerHandle {
    fn clone(&self) -> Self {
        Self {
            control_tx: self.control_tx.clone(),
            update_rx: self.update_rx.resubscribe(),
            info_channel: self.info_channel.clone(),
        }
    }
}
