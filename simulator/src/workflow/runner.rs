use crate::generator::profile::{build_fix_trace, idle_frame, orbit_frames};
use crate::workflow::config::{CaptureConfig, ScenarioConfig};
use anyhow::Context;
use geodrawcore::location::LocationFeed;
use geodrawcore::math::CameraFrame;
use geodrawcore::prelude::CoreError;
use geodrawcore::scene::RecordingScene;
use geodrawcore::session::{
    DrawingSummary, FrameFeed, SaveOutcome, SessionChannels, SessionEvent, SessionHandle,
    SessionOrchestrator,
};
use geodrawcore::store::{DrawingStore, JsonFileStore, MemoryStore};
use geodrawcore::telemetry::MetricsSnapshot;
use log::{info, warn};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const EVALUATION_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EventTally {
    pub found: usize,
    pub cleared: usize,
    pub saved: usize,
    pub lagged: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedCapture {
    pub title: String,
    pub outcome: SaveOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DriveReport {
    pub fixes_generated: usize,
    pub fixes_accepted: usize,
    pub saves: Vec<SavedCapture>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub fixes_generated: usize,
    pub fixes_accepted: usize,
    pub events: EventTally,
    pub saves: Vec<SavedCapture>,
    pub drawings: Vec<DrawingSummary>,
    pub metrics: MetricsSnapshot,
}

impl ScenarioResult {
    pub fn summary(&self) -> String {
        format!(
            "scenario '{}' -> fixes {}/{} accepted, found {}, cleared {}, saved {}, stored drawings {}, points captured {}",
            self.name,
            self.fixes_accepted,
            self.fixes_generated,
            self.events.found,
            self.events.cleared,
            self.saves.iter().filter(|save| save.outcome.committed()).count(),
            self.drawings.len(),
            self.metrics.points_captured
        )
    }
}

/// A session task running on the current runtime, plus its producer handles.
pub struct LiveSession {
    handle: SessionHandle,
    location: LocationFeed,
    task: JoinHandle<SessionOrchestrator>,
    tally: JoinHandle<EventTally>,
}

impl LiveSession {
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Stops the session task and folds everything observed into a result.
    pub async fn finish(self, name: &str, report: DriveReport) -> anyhow::Result<ScenarioResult> {
        let snapshot = self.handle.snapshot().await?;
        self.handle.shutdown().await?;
        let session = self.task.await.context("session task panicked")?;
        drop(session);
        drop(self.location);
        let events = self.tally.await.context("event collector panicked")?;

        Ok(ScenarioResult {
            name: name.to_string(),
            fixes_generated: report.fixes_generated,
            fixes_accepted: report.fixes_accepted,
            events,
            saves: report.saves,
            drawings: snapshot.drawings,
            metrics: snapshot.metrics,
        })
    }
}

async fn collect(mut events: broadcast::Receiver<SessionEvent>) -> EventTally {
    let mut tally = EventTally::default();
    loop {
        match events.recv().await {
            Ok(SessionEvent::DrawingFound { title, .. }) => {
                info!("[driver] found '{}' nearby", title);
                tally.found += 1;
            }
            Ok(SessionEvent::PresenceCleared { .. }) => tally.cleared += 1,
            Ok(SessionEvent::DrawingSaved { .. }) => tally.saved += 1,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("[driver] event collector skipped {} events", skipped);
                tally.lagged += skipped;
            }
            Err(RecvError::Closed) => break,
        }
    }
    tally
}

/// Pushes a frame, waiting for the session to drain a full queue first.
async fn deliver_frame(
    handle: &SessionHandle,
    frames: &FrameFeed,
    frame: CameraFrame,
) -> anyhow::Result<()> {
    while !frames.push(frame) {
        handle.snapshot().await?;
    }
    Ok(())
}

async fn pace(interval_ms: u64) {
    if interval_ms > 0 {
        sleep(Duration::from_millis(interval_ms)).await;
    }
}

#[derive(Clone)]
pub struct Runner {
    config: ScenarioConfig,
}

impl Runner {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }

    fn open_store(&self) -> Box<dyn DrawingStore> {
        match &self.config.store {
            Some(path) if self.config.uses_file_store() => {
                info!("[driver] persisting drawings to {}", path.display());
                Box::new(JsonFileStore::new(path))
            }
            _ => Box::new(MemoryStore::new()),
        }
    }

    /// Spawns the session task. Must be called from within a tokio runtime.
    pub fn start(&self) -> anyhow::Result<LiveSession> {
        let mut session = SessionOrchestrator::new(
            self.config.session.clone(),
            self.open_store(),
            Box::new(RecordingScene::new()),
        )
        .context("creating session")?
        .with_seed(self.config.route.seed);

        let tally = tokio::spawn(collect(session.subscribe()));
        let SessionChannels {
            handle,
            location,
            inputs,
        } = session.connect().context("connecting session")?;
        let task = tokio::spawn(session.run(inputs));

        Ok(LiveSession {
            handle,
            location,
            task,
            tally,
        })
    }

    /// Walks the route, performing the scripted capture along the way.
    pub async fn drive(&self, live: &LiveSession) -> anyhow::Result<DriveReport> {
        let fixes = build_fix_trace(&self.config.route)?;
        let frames = live.handle.frame_feed();
        let mut report = DriveReport {
            fixes_generated: fixes.len(),
            ..Default::default()
        };
        let mut expected = live.handle.snapshot().await?.metrics.fixes_evaluated;

        for (index, fix) in fixes.into_iter().enumerate() {
            deliver_frame(&live.handle, &frames, idle_frame(fix.timestamp)).await?;
            if live.location.deliver_one(fix) {
                report.fixes_accepted += 1;
                expected += 1;
                self.wait_for_evaluation(&live.handle, expected).await?;
            }
            if let Some(capture) = self.config.capture.as_ref().filter(|c| c.at_fix == index) {
                let outcome = self.capture(&live.handle, capture, fix.timestamp).await?;
                info!("[driver] capture '{}' -> {:?}", capture.title, outcome);
                report.saves.push(SavedCapture {
                    title: capture.title.clone(),
                    outcome,
                });
            }
            pace(self.config.pacing.fix_interval_ms).await;
        }

        Ok(report)
    }

    async fn wait_for_evaluation(&self, handle: &SessionHandle, expected: u64) -> anyhow::Result<()> {
        let deadline = self.config.session.warmup() + EVALUATION_GRACE;
        timeout(deadline, async {
            loop {
                if handle.snapshot().await?.metrics.fixes_evaluated >= expected {
                    return Ok::<(), CoreError>(());
                }
                sleep(POLL_INTERVAL).await;
            }
        })
        .await
        .context("timed out waiting for the session to evaluate a fix")??;
        Ok(())
    }

    async fn capture(
        &self,
        handle: &SessionHandle,
        capture: &CaptureConfig,
        time: f64,
    ) -> anyhow::Result<SaveOutcome> {
        handle.start_capture().await?;
        let frames = handle.frame_feed();
        for frame in orbit_frames(capture.orbit_radius, capture.frames, time) {
            deliver_frame(handle, &frames, frame).await?;
            pace(self.config.pacing.frame_interval_ms).await;
        }
        handle.stop_capture().await?;
        Ok(handle.save(capture.title.clone()).await?)
    }

    /// Starts a session, drives the whole scenario and shuts it down.
    pub async fn execute(&self) -> anyhow::Result<ScenarioResult> {
        let live = self.start()?;
        let report = self.drive(&live).await?;
        live.finish(&self.config.name, report).await
    }
}
