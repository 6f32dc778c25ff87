use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::events::{SaveOutcome, SessionSnapshot};
use crate::math::CameraFrame;
use crate::model::Drawing;
use crate::prelude::{CoreError, CoreResult};
use crate::telemetry::SessionMetrics;

type Reply<T> = oneshot::Sender<T>;

/// Main-queue input of the session task. Frames and user operations share
/// one queue so they are applied in submission order.
#[derive(Debug)]
pub enum SessionCommand {
    Frame(CameraFrame),
    StartCapture(Reply<bool>),
    StopCapture(Reply<bool>),
    ResetCapture(Reply<bool>),
    Save { name: String, reply: Reply<SaveOutcome> },
    Delete { drawing: Drawing, reply: Reply<bool> },
    WipeAll(Reply<()>),
    SetRadius { radius_m: f64, reply: Reply<f64> },
    SetArtistMode { enabled: bool, reply: Reply<()> },
    Snapshot(Reply<SessionSnapshot>),
    Shutdown,
}

/// Cloneable front end for UI collaborators.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    metrics: Arc<SessionMetrics>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>, metrics: Arc<SessionMetrics>) -> Self {
        Self { tx, metrics }
    }

    async fn send(&self, command: SessionCommand) -> CoreResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoreError::SessionClosed)
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> SessionCommand) -> CoreResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(build(reply)).await?;
        response.await.map_err(|_| CoreError::SessionClosed)
    }

    pub async fn start_capture(&self) -> CoreResult<bool> {
        self.request(SessionCommand::StartCapture).await
    }

    pub async fn stop_capture(&self) -> CoreResult<bool> {
        self.request(SessionCommand::StopCapture).await
    }

    pub async fn reset_capture(&self) -> CoreResult<bool> {
        self.request(SessionCommand::ResetCapture).await
    }

    pub async fn save(&self, name: impl Into<String>) -> CoreResult<SaveOutcome> {
        let name = name.into();
        self.request(|reply| SessionCommand::Save { name, reply })
            .await
    }

    pub async fn delete(&self, drawing: Drawing) -> CoreResult<bool> {
        self.request(|reply| SessionCommand::Delete { drawing, reply })
            .await
    }

    pub async fn wipe_all(&self) -> CoreResult<()> {
        self.request(SessionCommand::WipeAll).await
    }

    /// Returns the radius actually applied after clamping.
    pub async fn set_radius(&self, radius_m: f64) -> CoreResult<f64> {
        self.request(|reply| SessionCommand::SetRadius { radius_m, reply })
            .await
    }

    pub async fn set_artist_mode(&self, enabled: bool) -> CoreResult<()> {
        self.request(|reply| SessionCommand::SetArtistMode { enabled, reply })
            .await
    }

    pub async fn snapshot(&self) -> CoreResult<SessionSnapshot> {
        self.request(SessionCommand::Snapshot).await
    }

    pub async fn shutdown(&self) -> CoreResult<()> {
        self.send(SessionCommand::Shutdown).await
    }

    /// Non-blocking entry point for the render-frame callback.
    pub fn frame_feed(&self) -> FrameFeed {
        FrameFeed {
            tx: self.tx.clone(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Render-callback side of the main queue. Frames that do not fit are dropped.
#[derive(Clone)]
pub struct FrameFeed {
    tx: mpsc::Sender<SessionCommand>,
    metrics: Arc<SessionMetrics>,
}

impl FrameFeed {
    pub fn push(&self, frame: CameraFrame) -> bool {
        match self.tx.try_send(SessionCommand::Frame(frame)) {
            Ok(()) => true,
            Err(_) => {
                self.metrics.record_frame_dropped();
                false
            }
        }
    }
}
