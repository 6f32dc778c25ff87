use crate::generator::profile::RouteConfig;
use anyhow::Context;
use geodrawcore::prelude::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Scripted capture performed once the fix at `at_fix` has been delivered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub at_fix: usize,
    pub frames: usize,
    pub orbit_radius: f32,
    pub title: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            at_fix: 0,
            frames: 24,
            orbit_radius: 1.5,
            title: "loop".into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub fix_interval_ms: u64,
    pub frame_interval_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    pub store: Option<PathBuf>,
    /// Keep drawings in memory only, ignoring `store`.
    pub ephemeral: bool,
    pub session: SessionConfig,
    pub route: RouteConfig,
    pub capture: Option<CaptureConfig>,
    pub pacing: PacingConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            store: Some(PathBuf::from("data.json")),
            ephemeral: false,
            session: SessionConfig::default(),
            route: RouteConfig::default(),
            capture: Some(CaptureConfig::default()),
            pacing: PacingConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading scenario {}", path_ref.display()))?;
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
        config
            .session
            .validate()
            .with_context(|| format!("validating scenario {}", path_ref.display()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of a loaded or default scenario.
    pub fn with_overrides(
        mut self,
        store: Option<PathBuf>,
        radius_m: Option<f64>,
        seed: Option<u64>,
        ephemeral: bool,
    ) -> Self {
        if let Some(store) = store {
            self.store = Some(store);
        }
        if let Some(radius_m) = radius_m {
            self.session.radius_m = self.session.clamp_radius(radius_m);
        }
        if let Some(seed) = seed {
            self.route.seed = seed;
        }
        self.ephemeral |= ephemeral;
        self
    }

    pub fn uses_file_store(&self) -> bool {
        !self.ephemeral && self.store.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn overrides_replace_loaded_values() {
        let cfg = ScenarioConfig::default().with_overrides(
            Some(PathBuf::from("other.json")),
            Some(50.0),
            Some(9),
            false,
        );
        assert_eq!(cfg.store, Some(PathBuf::from("other.json")));
        assert_eq!(cfg.session.radius_m, 20.0);
        assert_eq!(cfg.route.seed, 9);
        assert!(cfg.uses_file_store());

        let cfg = cfg.with_overrides(None, None, None, true);
        assert!(!cfg.uses_file_store());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"name: plaza\nsession:\n  radius_m: 8\n  warmup_ms: 0\nroute:\n  steps_per_leg: 4\ncapture:\n  at_fix: 2\n  title: plaza mural\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = ScenarioConfig::load(&path).unwrap();

        assert_eq!(cfg.name, "plaza");
        assert_eq!(cfg.session.radius_m, 8.0);
        assert_eq!(cfg.session.max_horizontal_accuracy_m, 20.0);
        assert_eq!(cfg.route.steps_per_leg, 4);
        assert_eq!(cfg.route.waypoints.len(), 3);
        let capture = cfg.capture.unwrap();
        assert_eq!(capture.at_fix, 2);
        assert_eq!(capture.frames, 24);
        assert_eq!(capture.title, "plaza mural");
    }

    #[test]
    fn invalid_session_config_is_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"session:\n  min_radius_m: 30\n  max_radius_m: 10\n")
            .unwrap();
        let path = temp.into_temp_path();
        assert!(ScenarioConfig::load(&path).is_err());
    }
}
