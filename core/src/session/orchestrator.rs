//! Single-writer session task.
//!
//! The orchestrator owns the scene, the presence set, the active capture and
//! the drawing collection. Location fixes arrive on the [`LocationStream`];
//! frames and user operations arrive on the main queue. Both are applied on
//! one task, so no state here is shared or locked.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc};

use super::events::{DrawingSummary, SaveOutcome, SessionEvent, SessionSnapshot};
use super::handle::{SessionCommand, SessionHandle};
use crate::location::{LocationFeed, LocationSource, LocationStream};
use crate::math::{CameraFrame, CameraPose};
use crate::model::{Drawing, LocationFix};
use crate::prelude::{CoreError, CoreResult, SessionConfig};
use crate::processing::{CurveBuilder, PresenceController, PresenceOutcome, PresenceState};
use crate::scene::{Material, SceneGraph, SceneState};
use crate::store::DrawingStore;
use crate::telemetry::{LogManager, MetricsSnapshot, SessionMetrics};

/// Receiving ends consumed by [`SessionOrchestrator::run`].
pub struct SessionInputs {
    pub fixes: LocationStream,
    pub commands: mpsc::Receiver<SessionCommand>,
}

/// Everything a platform integration needs to drive one session.
pub struct SessionChannels {
    pub handle: SessionHandle,
    pub location: LocationFeed,
    pub inputs: SessionInputs,
}

pub struct SessionOrchestrator {
    config: SessionConfig,
    store: Box<dyn DrawingStore>,
    drawings: Vec<Drawing>,
    scene: SceneState,
    presence: PresenceController,
    curve: CurveBuilder,
    location: Option<LocationFix>,
    camera: Option<CameraPose>,
    radius_m: f64,
    artist_mode: bool,
    rng: StdRng,
    events: broadcast::Sender<SessionEvent>,
    metrics: Arc<SessionMetrics>,
    connected: bool,
    logger: LogManager,
}

impl SessionOrchestrator {
    /// Validates the config and loads the persisted collection (empty on failure).
    pub fn new(
        config: SessionConfig,
        store: Box<dyn DrawingStore>,
        graph: Box<dyn SceneGraph>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let drawings = store.load().unwrap_or_default();
        let (events, _) = broadcast::channel(config.event_capacity);
        let logger = LogManager::new("session");
        logger.record(&format!("loaded {} drawings", drawings.len()));

        Ok(Self {
            radius_m: config.radius_m,
            curve: CurveBuilder::new(&config),
            presence: PresenceController::new(&config),
            config,
            store,
            drawings,
            scene: SceneState::new(graph),
            location: None,
            camera: None,
            artist_mode: false,
            rng: StdRng::from_entropy(),
            events,
            metrics: Arc::new(SessionMetrics::new()),
            connected: false,
            logger,
        })
    }

    /// Makes material colours reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Creates the location stream and main queue for this session.
    ///
    /// A session has exactly one of each; a second call fails.
    pub fn connect(&mut self) -> CoreResult<SessionChannels> {
        if std::mem::replace(&mut self.connected, true) {
            return Err(CoreError::AlreadyConnected);
        }
        let (location, fixes) = LocationSource::channel(&self.config, self.metrics.clone());
        let (tx, commands) = mpsc::channel(self.config.command_capacity);
        Ok(SessionChannels {
            handle: SessionHandle::new(tx, self.metrics.clone()),
            location,
            inputs: SessionInputs { fixes, commands },
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Serves the session until shutdown or until the main queue closes.
    ///
    /// The location stream is not consumed before the warm-up delay has
    /// elapsed; frames and commands are served from the start.
    pub async fn run(mut self, inputs: SessionInputs) -> Self {
        let SessionInputs {
            mut fixes,
            mut commands,
        } = inputs;
        let warmup = tokio::time::sleep(self.config.warmup());
        tokio::pin!(warmup);
        let mut listening = self.config.warmup_ms == 0;
        let mut fixes_open = true;
        self.logger.record("session task started");

        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.dispatch(command),
                },
                _ = &mut warmup, if !listening => {
                    listening = true;
                    self.logger.record("warm-up elapsed, consuming location stream");
                }
                fix = fixes.next(), if listening && fixes_open => match fix {
                    Some(fix) => {
                        self.on_location_fix(fix);
                    }
                    None => {
                        fixes_open = false;
                        self.logger.record("location stream ended");
                    }
                },
            }
        }

        self.logger.record("session task stopped");
        self
    }

    fn dispatch(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Frame(frame) => self.on_frame(&frame),
            SessionCommand::StartCapture(reply) => {
                let _ = reply.send(self.start_capture());
            }
            SessionCommand::StopCapture(reply) => {
                let _ = reply.send(self.stop_capture());
            }
            SessionCommand::ResetCapture(reply) => {
                let _ = reply.send(self.reset_capture());
            }
            SessionCommand::Save { name, reply } => {
                let _ = reply.send(self.save(&name));
            }
            SessionCommand::Delete { drawing, reply } => {
                let _ = reply.send(self.delete(&drawing));
            }
            SessionCommand::WipeAll(reply) => {
                self.wipe_all();
                let _ = reply.send(());
            }
            SessionCommand::SetRadius { radius_m, reply } => {
                let _ = reply.send(self.set_radius(radius_m));
            }
            SessionCommand::SetArtistMode { enabled, reply } => {
                self.set_artist_mode(enabled);
                let _ = reply.send(());
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            SessionCommand::Shutdown => {}
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Presence is suspended while authoring.
    pub fn is_authoring(&self) -> bool {
        self.artist_mode || self.curve.is_drawing()
    }

    /// One presence tick. Returns `None` when skipped for authoring.
    pub fn on_location_fix(&mut self, fix: LocationFix) -> Option<PresenceOutcome> {
        self.location = Some(fix);
        self.metrics.record_fix_evaluated();
        self.emit(SessionEvent::LocationUpdated { fix });

        if self.is_authoring() {
            return None;
        }

        let outcome = self.presence.evaluate(
            &fix,
            &self.drawings,
            self.radius_m,
            self.camera.as_ref(),
            &mut self.scene,
            &mut self.rng,
        );
        match &outcome {
            PresenceOutcome::Materialized { token, title, .. } => {
                self.metrics.record_materialized();
                self.emit(SessionEvent::DrawingFound {
                    token: *token,
                    title: title.clone(),
                });
            }
            PresenceOutcome::Dematerialized { released } => {
                self.metrics.record_dematerialized(*released);
                self.emit(SessionEvent::PresenceCleared {
                    released: *released,
                });
            }
            PresenceOutcome::Deferred | PresenceOutcome::Unchanged => {}
        }
        Some(outcome)
    }

    /// One render-frame tick.
    pub fn on_frame(&mut self, frame: &CameraFrame) {
        self.camera = Some(frame.pose);
        self.metrics.record_frame();
        if self.curve.on_frame(frame, &mut self.scene).is_some() {
            self.metrics.record_point();
        }
    }

    pub fn start_capture(&mut self) -> bool {
        let material = Material::random(&mut self.rng);
        if !self.curve.start(&mut self.scene, material) {
            return false;
        }
        self.emit(SessionEvent::DrawingModeChanged { drawing: true });
        true
    }

    pub fn stop_capture(&mut self) -> bool {
        if !self.curve.stop() {
            return false;
        }
        self.emit(SessionEvent::DrawingModeChanged { drawing: false });
        true
    }

    pub fn reset_capture(&mut self) -> bool {
        let was_drawing = self.curve.is_drawing();
        let discarded = self.curve.reset(&mut self.scene);
        if discarded {
            self.emit(SessionEvent::CaptureDiscarded);
        }
        if was_drawing {
            self.emit(SessionEvent::DrawingModeChanged { drawing: false });
        }
        discarded
    }

    /// Commits the active capture as a drawing anchored at the current fix.
    pub fn save(&mut self, name: &str) -> SaveOutcome {
        let Some(fix) = self.location else {
            self.logger.detail("save ignored: no location fix yet");
            return SaveOutcome::NoLocation;
        };
        if !self.curve.has_capture() {
            self.logger.detail("save ignored: no active curve");
            return SaveOutcome::NoCapture;
        }

        let mut persisted = self.store.load().unwrap_or_default();
        let was_drawing = self.curve.is_drawing();
        let Some(points) = self.curve.take_capture(&mut self.scene) else {
            return SaveOutcome::NoCapture;
        };
        let drawing = Drawing::new(name, fix.coordinate, points);
        self.logger.record(&format!(
            "saving '{}' with {} points at {:.6},{:.6}",
            drawing.title,
            drawing.point_count(),
            fix.coordinate.latitude,
            fix.coordinate.longitude
        ));
        persisted.push(drawing);

        let written = self.store.save(&persisted);
        if !written {
            self.metrics.record_store_error();
        }
        self.drawings = self.store.load().unwrap_or_default();

        if was_drawing {
            self.emit(SessionEvent::DrawingModeChanged { drawing: false });
        }
        self.emit(SessionEvent::DrawingSaved {
            title: name.to_string(),
        });
        self.emit(SessionEvent::DrawingsChanged {
            count: self.drawings.len(),
        });

        if written {
            SaveOutcome::Saved
        } else {
            SaveOutcome::StoreFailed
        }
    }

    /// Removes the first drawing with the same identity and persists the rest.
    pub fn delete(&mut self, drawing: &Drawing) -> bool {
        let Some(index) = self.drawings.iter().position(|d| d == drawing) else {
            return false;
        };
        let removed = self.drawings.remove(index);
        if !self.store.save(&self.drawings) {
            self.metrics.record_store_error();
        }
        self.logger.record(&format!("deleted '{}'", removed.title));
        self.emit(SessionEvent::DrawingsChanged {
            count: self.drawings.len(),
        });
        true
    }

    /// Persists an empty collection and releases every materialized node.
    pub fn wipe_all(&mut self) {
        if !self.store.save(&[]) {
            self.metrics.record_store_error();
        }
        let released = self.presence.clear(&mut self.scene);
        if released > 0 {
            self.metrics.record_dematerialized(released);
            self.emit(SessionEvent::PresenceCleared { released });
        }
        self.drawings.clear();
        self.logger.record("wiped all drawings");
        self.emit(SessionEvent::DrawingsChanged { count: 0 });
    }

    /// Applies a new search radius, clamped to the configured bounds.
    pub fn set_radius(&mut self, radius_m: f64) -> f64 {
        if !radius_m.is_nan() {
            self.radius_m = self.config.clamp_radius(radius_m);
        }
        self.radius_m
    }

    pub fn set_artist_mode(&mut self, enabled: bool) {
        self.artist_mode = enabled;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            presence: self.presence.state(),
            showing: self.presence.showing().map(str::to_string),
            drawing: self.curve.is_drawing(),
            artist_mode: self.artist_mode,
            radius_m: self.radius_m,
            location: self.location,
            uncommitted_points: self.curve.point_count(),
            live_nodes: self.scene.attached_count(),
            drawings: self.drawings.iter().map(DrawingSummary::from).collect(),
            metrics: self.metrics.snapshot(),
        }
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    pub fn location(&self) -> Option<&LocationFix> {
        self.location.as_ref()
    }

    pub fn presence_state(&self) -> PresenceState {
        self.presence.state()
    }

    pub fn is_drawing(&self) -> bool {
        self.curve.is_drawing()
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
