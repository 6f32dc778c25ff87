use super::drawing::Coordinate;
use serde::{Deserialize, Serialize};

/// One timestamped GPS reading with its horizontal accuracy estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub horizontal_accuracy: f64,
    pub timestamp: f64,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, horizontal_accuracy: f64, timestamp: f64) -> Self {
        Self {
            coordinate,
            horizontal_accuracy,
            timestamp,
        }
    }

    /// True when the accuracy estimate is within `limit_m`. NaN never qualifies.
    pub fn is_accurate_within(&self, limit_m: f64) -> bool {
        self.horizontal_accuracy <= limit_m
    }
}
