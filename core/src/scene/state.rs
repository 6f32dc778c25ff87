use std::collections::{HashMap, HashSet};
use std::fmt;

use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::graph::SceneGraph;
use super::tube::TubeMesh;

/// Handle through which components refer to scene nodes they do not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: [f32; 4],
    pub double_sided: bool,
}

impl Material {
    /// Opaque, double-sided material with a random colour.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            color: [rng.gen(), rng.gen(), rng.gen(), 1.0],
            double_sided: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub mesh: TubeMesh,
    pub material: Material,
    pub position: Vector3<f32>,
}

impl SceneNode {
    pub fn new(mesh: TubeMesh, material: Material) -> Self {
        Self {
            mesh,
            material,
            position: Vector3::zeros(),
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }
}

/// Sole owner of every node the session creates, attached or not.
pub struct SceneState {
    nodes: HashMap<NodeId, SceneNode>,
    attached: HashSet<NodeId>,
    graph: Box<dyn SceneGraph>,
}

impl SceneState {
    pub fn new(graph: Box<dyn SceneGraph>) -> Self {
        Self {
            nodes: HashMap::new(),
            attached: HashSet::new(),
            graph,
        }
    }

    /// Takes ownership of a node without showing it.
    pub fn insert(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, node);
        id
    }

    /// Adds an owned node to the live scene. Attaching twice is a no-op.
    pub fn attach(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if !self.attached.insert(id) {
            return false;
        }
        self.graph.add_node(id, node);
        true
    }

    /// Appends a point to a node's tube and pushes the new geometry if it is shown.
    pub fn extend_path(&mut self, id: NodeId, point: Vector3<f32>) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let grew = node.mesh.push(point);
        if grew && self.attached.contains(&id) {
            self.graph.update_node(id, node);
        }
        grew
    }

    /// Removes a node from the live scene (if shown) and drops ownership of it.
    pub fn release(&mut self, id: NodeId) -> Option<SceneNode> {
        if self.attached.remove(&id) {
            self.graph.remove_node(id);
        }
        self.nodes.remove(&id)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::TubeParams;
    use crate::scene::RecordingScene;
    use rand::{rngs::StdRng, SeedableRng};

    fn node() -> SceneNode {
        let mut rng = StdRng::seed_from_u64(7);
        SceneNode::new(TubeMesh::new(TubeParams::default()), Material::random(&mut rng))
    }

    #[test]
    fn attach_and_release_reach_the_backend_once() {
        let recording = RecordingScene::new();
        let mut scene = SceneState::new(Box::new(recording.clone()));

        let id = scene.insert(node());
        assert_eq!(recording.live_count(), 0);

        assert!(scene.attach(id));
        assert!(!scene.attach(id));
        assert_eq!(recording.live_count(), 1);

        assert!(scene.release(id).is_some());
        assert!(scene.release(id).is_none());
        assert_eq!(recording.live_count(), 0);
        assert_eq!(recording.totals(), (1, 0, 1));
        assert!(scene.is_empty());
    }

    #[test]
    fn growing_an_attached_node_updates_the_backend() {
        let recording = RecordingScene::new();
        let mut scene = SceneState::new(Box::new(recording.clone()));
        let id = scene.insert(node());
        scene.attach(id);

        scene.extend_path(id, Vector3::new(0.0, 0.0, -1.0));
        scene.extend_path(id, Vector3::new(0.0, 0.1, -1.0));

        let recorded = recording.live_node(id).unwrap();
        assert_eq!(recorded.ring_count, 2);
        assert_eq!(recording.totals().1, 2);
    }

    #[test]
    fn random_material_is_opaque_and_double_sided() {
        let mut rng = StdRng::seed_from_u64(1);
        let material = Material::random(&mut rng);
        assert_eq!(material.color[3], 1.0);
        assert!(material.color[..3].iter().all(|c| (0.0..1.0).contains(c)));
        assert!(material.double_sided);
    }
}
