use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cross-section and smoothing parameters for extruded curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TubeParams {
    pub radius: f32,
    pub edges: usize,
    pub max_turning_deg: f32,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            radius: 0.05,
            edges: 12,
            max_turning_deg: 12.0,
        }
    }
}

/// Shared configuration for a drawing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub radius_m: f64,
    pub min_radius_m: f64,
    pub max_radius_m: f64,
    pub max_horizontal_accuracy_m: f64,
    pub warmup_ms: u64,
    pub placement_distance: f32,
    pub capture_distance: f32,
    pub tube: TubeParams,
    pub command_capacity: usize,
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            radius_m: 5.0,
            min_radius_m: 3.0,
            max_radius_m: 20.0,
            max_horizontal_accuracy_m: 20.0,
            warmup_ms: 1000,
            placement_distance: 2.0,
            capture_distance: 1.0,
            tube: TubeParams::default(),
            command_capacity: 64,
            event_capacity: 64,
        }
    }
}

impl SessionConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// Clamps a requested radius into the configured bounds.
    pub fn clamp_radius(&self, radius_m: f64) -> f64 {
        radius_m.clamp(self.min_radius_m, self.max_radius_m)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(self.min_radius_m > 0.0 && self.min_radius_m <= self.max_radius_m) {
            return Err(CoreError::InvalidConfig(format!(
                "radius bounds {}..{} are not a positive range",
                self.min_radius_m, self.max_radius_m
            )));
        }
        if !(self.min_radius_m..=self.max_radius_m).contains(&self.radius_m) {
            return Err(CoreError::InvalidConfig(format!(
                "radius {} outside {}..{}",
                self.radius_m, self.min_radius_m, self.max_radius_m
            )));
        }
        if self.max_horizontal_accuracy_m.is_nan() || self.max_horizontal_accuracy_m < 0.0 {
            return Err(CoreError::InvalidConfig(
                "accuracy limit must be non-negative".into(),
            ));
        }
        if self.placement_distance <= 0.0 || self.capture_distance <= 0.0 {
            return Err(CoreError::InvalidConfig(
                "placement and capture distances must be positive".into(),
            ));
        }
        if self.tube.edges < 3 || self.tube.radius <= 0.0 || self.tube.max_turning_deg <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "tube needs >= 3 edges and positive radius/turning, got {:?}",
                self.tube
            )));
        }
        if self.command_capacity == 0 || self.event_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "channel capacities must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Common error type for the session core.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("session task is no longer running")]
    SessionClosed,
    #[error("session channels were already handed out")]
    AlreadyConnected,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.warmup(), Duration::from_secs(1));
        assert_eq!(config.tube.edges, 12);
    }

    #[test]
    fn radius_is_clamped_to_bounds() {
        let config = SessionConfig::default();
        assert_eq!(config.clamp_radius(1.0), 3.0);
        assert_eq!(config.clamp_radius(50.0), 20.0);
        assert_eq!(config.clamp_radius(7.5), 7.5);
    }

    #[test]
    fn degenerate_tube_is_rejected() {
        let config = SessionConfig {
            tube: TubeParams {
                edges: 2,
                ..TubeParams::default()
            },
            ..SessionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"radius_m": 8.0}"#).unwrap();
        assert_eq!(config.radius_m, 8.0);
        assert_eq!(config.warmup_ms, 1000);
    }
}
