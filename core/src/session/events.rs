use serde::Serialize;
use uuid::Uuid;

use crate::model::{Coordinate, Drawing, LocationFix};
use crate::processing::PresenceState;
use crate::telemetry::MetricsSnapshot;

/// Notifications published by the session for UI layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    LocationUpdated { fix: LocationFix },
    /// One-shot "found" notification; `token` is unique per materialization.
    DrawingFound { token: Uuid, title: String },
    PresenceCleared { released: usize },
    DrawingModeChanged { drawing: bool },
    CaptureDiscarded,
    DrawingSaved { title: String },
    DrawingsChanged { count: usize },
}

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    /// The write failed. The capture was discarded and nothing was persisted.
    StoreFailed,
    NoLocation,
    NoCapture,
}

impl SaveOutcome {
    /// True only when the drawing reached storage.
    pub fn committed(self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }

    /// True when the active capture was used up, whether or not it was persisted.
    pub fn consumed_capture(self) -> bool {
        matches!(self, SaveOutcome::Saved | SaveOutcome::StoreFailed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawingSummary {
    pub title: String,
    pub coordinates: Coordinate,
    pub points: usize,
}

impl From<&Drawing> for DrawingSummary {
    fn from(drawing: &Drawing) -> Self {
        Self {
            title: drawing.title.clone(),
            coordinates: drawing.coordinates,
            points: drawing.point_count(),
        }
    }
}

/// Point-in-time view of the session for polling UIs.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub presence: PresenceState,
    pub showing: Option<String>,
    pub drawing: bool,
    pub artist_mode: bool,
    pub radius_m: f64,
    pub location: Option<LocationFix>,
    pub uncommitted_points: usize,
    pub live_nodes: usize,
    pub drawings: Vec<DrawingSummary>,
    pub metrics: MetricsSnapshot,
}
