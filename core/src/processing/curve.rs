use crate::math::CameraFrame;
use crate::model::ScenePoint;
use crate::prelude::{SessionConfig, TubeParams};
use crate::scene::{Material, NodeId, SceneNode, SceneState, TubeMesh};
use crate::telemetry::LogManager;

/// Points captured so far and the uncommitted node that renders them.
#[derive(Debug)]
struct ActiveCapture {
    node: NodeId,
    points: Vec<ScenePoint>,
}

/// Extrudes a tube along the camera-forward point while drawing.
pub struct CurveBuilder {
    drawing: bool,
    capture: Option<ActiveCapture>,
    tube: TubeParams,
    capture_distance: f32,
    logger: LogManager,
}

impl CurveBuilder {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            drawing: false,
            capture: None,
            tube: config.tube,
            capture_distance: config.capture_distance,
            logger: LogManager::new("curve"),
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    pub fn capture_node(&self) -> Option<NodeId> {
        self.capture.as_ref().map(|capture| capture.node)
    }

    pub fn point_count(&self) -> usize {
        self.capture
            .as_ref()
            .map(|capture| capture.points.len())
            .unwrap_or(0)
    }

    /// Begins a new curve. Returns `false` if already drawing.
    pub fn start(&mut self, scene: &mut SceneState, material: Material) -> bool {
        if self.drawing {
            return false;
        }
        if let Some(stale) = self.capture.take() {
            scene.release(stale.node);
            self.logger.detail(&format!(
                "discarded uncommitted curve with {} points",
                stale.points.len()
            ));
        }
        let node = scene.insert(SceneNode::new(TubeMesh::new(self.tube), material));
        self.capture = Some(ActiveCapture {
            node,
            points: Vec::new(),
        });
        self.drawing = true;
        self.logger.record(&format!("capture started on node {}", node));
        true
    }

    /// Appends the point in front of the camera while drawing.
    pub fn on_frame(&mut self, frame: &CameraFrame, scene: &mut SceneState) -> Option<ScenePoint> {
        if !self.drawing {
            return None;
        }
        let capture = self.capture.as_mut()?;
        let point = frame.pose.point_ahead(self.capture_distance);
        capture.points.push(ScenePoint::from(point));
        scene.extend_path(capture.node, point);
        scene.attach(capture.node);
        Some(ScenePoint::from(point))
    }

    /// Leaves drawing mode; the curve stays in the scene, uncommitted.
    pub fn stop(&mut self) -> bool {
        std::mem::replace(&mut self.drawing, false)
    }

    /// Removes and releases the uncommitted curve.
    pub fn reset(&mut self, scene: &mut SceneState) -> bool {
        self.drawing = false;
        match self.capture.take() {
            Some(capture) => {
                scene.release(capture.node);
                self.logger.record(&format!(
                    "capture reset, {} points discarded",
                    capture.points.len()
                ));
                true
            }
            None => false,
        }
    }

    /// Ends the capture, releases its node and hands back the captured points.
    pub fn take_capture(&mut self, scene: &mut SceneState) -> Option<Vec<ScenePoint>> {
        let capture = self.capture.take()?;
        scene.release(capture.node);
        self.drawing = false;
        Some(capture.points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::CameraPose;
    use crate::scene::RecordingScene;
    use nalgebra::{UnitQuaternion, Vector3};
    use rand::{rngs::StdRng, SeedableRng};

    fn setup() -> (CurveBuilder, SceneState, RecordingScene, Material) {
        let recording = RecordingScene::new();
        let scene = SceneState::new(Box::new(recording.clone()));
        let material = Material::random(&mut StdRng::seed_from_u64(11));
        (
            CurveBuilder::new(&SessionConfig::default()),
            scene,
            recording,
            material,
        )
    }

    fn frame_at(x: f32) -> CameraFrame {
        CameraFrame::new(
            CameraPose::from_parts(Vector3::new(x, 1.5, 0.0), UnitQuaternion::identity()),
            x as f64,
        )
    }

    #[test]
    fn start_is_a_no_op_while_drawing() {
        let (mut curve, mut scene, _, material) = setup();
        assert!(curve.start(&mut scene, material));
        let node = curve.capture_node();

        assert!(!curve.start(&mut scene, material));
        assert_eq!(curve.capture_node(), node);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn frames_append_points_one_unit_ahead() {
        let (mut curve, mut scene, recording, material) = setup();
        assert!(curve.on_frame(&frame_at(0.0), &mut scene).is_none());

        curve.start(&mut scene, material);
        for i in 0..5 {
            let point = curve.on_frame(&frame_at(i as f32 * 0.1), &mut scene).unwrap();
            assert_eq!(point.z, -1.0);
            assert_eq!(point.y, 1.5);
        }

        assert_eq!(curve.point_count(), 5);
        let node = curve.capture_node().unwrap();
        assert_eq!(recording.live_node(node).unwrap().ring_count, 5);
    }

    #[test]
    fn stop_keeps_the_uncommitted_curve_visible() {
        let (mut curve, mut scene, recording, material) = setup();
        curve.start(&mut scene, material);
        curve.on_frame(&frame_at(0.0), &mut scene);
        curve.on_frame(&frame_at(0.2), &mut scene);

        assert!(curve.stop());
        assert!(!curve.is_drawing());
        assert!(curve.on_frame(&frame_at(0.4), &mut scene).is_none());
        assert_eq!(recording.live_count(), 1);
        assert_eq!(curve.point_count(), 2);
    }

    #[test]
    fn reset_releases_the_node() {
        let (mut curve, mut scene, recording, material) = setup();
        curve.start(&mut scene, material);
        curve.on_frame(&frame_at(0.0), &mut scene);

        assert!(curve.reset(&mut scene));
        assert_eq!(recording.live_count(), 0);
        assert!(scene.is_empty());
        assert!(!curve.has_capture());
        assert!(!curve.reset(&mut scene));
    }

    #[test]
    fn restarting_after_stop_discards_the_stale_curve() {
        let (mut curve, mut scene, recording, material) = setup();
        curve.start(&mut scene, material);
        curve.on_frame(&frame_at(0.0), &mut scene);
        curve.stop();

        assert!(curve.start(&mut scene, material));
        assert_eq!(recording.live_count(), 0);
        assert_eq!(scene.len(), 1);
        assert_eq!(curve.point_count(), 0);
    }

    #[test]
    fn take_capture_hands_back_points_and_releases() {
        let (mut curve, mut scene, recording, material) = setup();
        curve.start(&mut scene, material);
        curve.on_frame(&frame_at(0.0), &mut scene);
        curve.on_frame(&frame_at(0.3), &mut scene);

        let points = curve.take_capture(&mut scene).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(recording.live_count(), 0);
        assert!(!curve.is_drawing());
        assert!(curve.take_capture(&mut scene).is_none());
    }
}
