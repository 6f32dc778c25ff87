use geodrawcore::session::SaveOutcome;
use serde::{Deserialize, Serialize};

/// Body of `POST /command`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BridgeCommand {
    Start,
    Stop,
    Reset,
    Save { title: String },
    /// Drawings are identified by title and anchor coordinate.
    Delete {
        title: String,
        latitude: f64,
        longitude: f64,
    },
    Wipe,
    Radius { meters: f64 },
    Artist { enabled: bool },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandReply {
    Ok { changed: bool },
    Saved { outcome: SaveOutcome },
    Radius { applied_m: f64 },
    Error { message: String },
}
