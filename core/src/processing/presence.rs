use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use super::geo_index::GeoIndex;
use crate::math::CameraPose;
use crate::model::{Drawing, LocationFix};
use crate::prelude::{SessionConfig, TubeParams};
use crate::scene::{Material, NodeId, SceneNode, SceneState, TubeMesh};
use crate::telemetry::LogManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresenceState {
    Empty,
    Showing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenceOutcome {
    /// A nearby drawing was added to the scene; `token` is fresh for every materialization.
    Materialized {
        token: Uuid,
        node: NodeId,
        title: String,
    },
    /// The fix left range and every tracked node was released.
    Dematerialized { released: usize },
    /// A drawing is in range but no camera pose is known yet; nothing was added.
    Deferred,
    Unchanged,
}

/// Materializes at most one nearby drawing at a time.
pub struct PresenceController {
    materialized: Vec<NodeId>,
    showing: Option<String>,
    tube: TubeParams,
    placement_distance: f32,
    logger: LogManager,
}

impl PresenceController {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            materialized: Vec::new(),
            showing: None,
            tube: config.tube,
            placement_distance: config.placement_distance,
            logger: LogManager::new("presence"),
        }
    }

    pub fn state(&self) -> PresenceState {
        if self.materialized.is_empty() {
            PresenceState::Empty
        } else {
            PresenceState::Showing
        }
    }

    pub fn materialized(&self) -> &[NodeId] {
        &self.materialized
    }

    pub fn showing(&self) -> Option<&str> {
        self.showing.as_deref()
    }

    /// Runs one presence tick for an accepted fix.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        fix: &LocationFix,
        drawings: &[Drawing],
        radius_m: f64,
        camera: Option<&CameraPose>,
        scene: &mut SceneState,
        rng: &mut R,
    ) -> PresenceOutcome {
        match (GeoIndex::find_nearby(fix, drawings, radius_m), self.state()) {
            (Some(_), PresenceState::Showing) => PresenceOutcome::Unchanged,
            (Some(drawing), PresenceState::Empty) => {
                let Some(camera) = camera else {
                    self.logger.detail(&format!(
                        "'{}' in range but no camera pose yet",
                        drawing.title
                    ));
                    return PresenceOutcome::Deferred;
                };
                let mesh = TubeMesh::from_path(self.tube, drawing.path());
                let node = SceneNode::new(mesh, Material::random(rng))
                    .with_position(camera.placement_ahead(self.placement_distance));
                let id = scene.insert(node);
                scene.attach(id);
                self.materialized.push(id);
                self.showing = Some(drawing.title.clone());
                self.logger.record(&format!(
                    "materialized '{}' ({} points) as node {}",
                    drawing.title,
                    drawing.point_count(),
                    id
                ));
                PresenceOutcome::Materialized {
                    token: Uuid::new_v4(),
                    node: id,
                    title: drawing.title.clone(),
                }
            }
            (None, PresenceState::Showing) => PresenceOutcome::Dematerialized {
                released: self.clear(scene),
            },
            (None, PresenceState::Empty) => PresenceOutcome::Unchanged,
        }
    }

    /// Releases every tracked node and returns how many were released.
    pub fn clear(&mut self, scene: &mut SceneState) -> usize {
        let released = self.materialized.len();
        for id in self.materialized.drain(..) {
            scene.release(id);
        }
        if let Some(title) = self.showing.take() {
            self.logger
                .record(&format!("dematerialized '{}' ({} nodes)", title, released));
        }
        released
    }
}

impl Default for PresenceController {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::GeodesyHelper;
    use crate::model::{Coordinate, ScenePoint};
    use crate::scene::RecordingScene;
    use nalgebra::{UnitQuaternion, Vector3};
    use rand::{rngs::StdRng, SeedableRng};

    const ORIGIN: Coordinate = Coordinate {
        latitude: 45.5017,
        longitude: -73.5673,
    };

    struct Harness {
        controller: PresenceController,
        scene: SceneState,
        recording: RecordingScene,
        drawings: Vec<Drawing>,
        rng: StdRng,
        camera: CameraPose,
    }

    impl Harness {
        fn new() -> Self {
            let recording = RecordingScene::new();
            let points = vec![
                ScenePoint::new(0.0, 0.0, -1.0),
                ScenePoint::new(0.1, 0.0, -1.0),
                ScenePoint::new(0.2, 0.01, -1.0),
            ];
            Self {
                controller: PresenceController::new(&SessionConfig::default()),
                scene: SceneState::new(Box::new(recording.clone())),
                recording,
                drawings: vec![Drawing::new("mural", ORIGIN, points)],
                rng: StdRng::seed_from_u64(3),
                camera: CameraPose::identity(),
            }
        }

        fn tick(&mut self, north_m: f64) -> PresenceOutcome {
            let fix = LocationFix::new(GeodesyHelper::offset_north(ORIGIN, north_m), 5.0, 0.0);
            self.controller.evaluate(
                &fix,
                &self.drawings,
                5.0,
                Some(&self.camera),
                &mut self.scene,
                &mut self.rng,
            )
        }
    }

    #[test]
    fn in_in_out_in_sequence_never_duplicates_or_leaks() {
        let mut h = Harness::new();

        let first = h.tick(1.0);
        let first_token = match first {
            PresenceOutcome::Materialized { token, .. } => token,
            other => panic!("expected materialization, got {other:?}"),
        };
        assert_eq!(h.recording.live_count(), 1);

        assert_eq!(h.tick(2.0), PresenceOutcome::Unchanged);
        assert_eq!(h.recording.live_count(), 1);
        assert_eq!(h.controller.materialized().len(), 1);

        assert_eq!(h.tick(50.0), PresenceOutcome::Dematerialized { released: 1 });
        assert_eq!(h.recording.live_count(), 0);
        assert!(h.scene.is_empty());
        assert_eq!(h.controller.state(), PresenceState::Empty);

        match h.tick(0.0) {
            PresenceOutcome::Materialized { token, .. } => assert_ne!(token, first_token),
            other => panic!("expected re-materialization, got {other:?}"),
        }
        assert_eq!(h.recording.live_count(), 1);
        assert_eq!(h.recording.totals(), (2, 0, 1));
    }

    #[test]
    fn node_is_placed_two_units_ahead_of_the_camera() {
        let mut h = Harness::new();
        h.camera = CameraPose::from_parts(Vector3::new(0.5, 1.0, 0.0), UnitQuaternion::identity());

        let PresenceOutcome::Materialized { node, .. } = h.tick(0.0) else {
            panic!("expected materialization");
        };
        let recorded = h.recording.live_node(node).unwrap();
        assert_eq!(recorded.position, [0.5, 1.0, -2.0]);
        assert_eq!(recorded.ring_count, 3);
    }

    #[test]
    fn missing_camera_defers_without_tracking() {
        let mut h = Harness::new();
        let fix = LocationFix::new(ORIGIN, 5.0, 0.0);

        let outcome = h.controller.evaluate(
            &fix,
            &h.drawings,
            5.0,
            None,
            &mut h.scene,
            &mut h.rng,
        );

        assert_eq!(outcome, PresenceOutcome::Deferred);
        assert_eq!(h.controller.state(), PresenceState::Empty);
        assert!(h.scene.is_empty());
    }

    #[test]
    fn placement_distance_comes_from_the_session_config() {
        let mut h = Harness::new();
        h.controller = PresenceController::new(&SessionConfig {
            placement_distance: 3.5,
            ..SessionConfig::default()
        });

        let PresenceOutcome::Materialized { node, .. } = h.tick(0.0) else {
            panic!("expected materialization");
        };
        assert_eq!(h.recording.live_node(node).unwrap().position, [0.0, 0.0, -3.5]);
    }

    #[test]
    fn staying_out_of_range_is_a_no_op() {
        let mut h = Harness::new();
        assert_eq!(h.tick(100.0), PresenceOutcome::Unchanged);
        assert_eq!(h.recording.totals(), (0, 0, 0));
    }
}
