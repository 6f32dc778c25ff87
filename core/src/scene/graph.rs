use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::state::{NodeId, SceneNode};

/// Rendering-engine side of the live scene.
///
/// The session mutates the scene only from its own task, so implementations
/// need no internal synchronization beyond `Send`.
pub trait SceneGraph: Send {
    fn add_node(&mut self, id: NodeId, node: &SceneNode);
    fn update_node(&mut self, id: NodeId, node: &SceneNode);
    fn remove_node(&mut self, id: NodeId);
}

/// Summary of a node as seen by the recording backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNode {
    pub ring_count: usize,
    pub triangle_count: usize,
    pub position: [f32; 3],
}

impl RecordedNode {
    fn from_node(node: &SceneNode) -> Self {
        Self {
            ring_count: node.mesh.ring_count(),
            triangle_count: node.mesh.triangle_count(),
            position: [node.position.x, node.position.y, node.position.z],
        }
    }
}

#[derive(Debug, Default)]
struct Recording {
    live: HashMap<NodeId, RecordedNode>,
    added: usize,
    updated: usize,
    removed: usize,
}

/// In-memory scene backend for headless runs and tests.
///
/// Clones share the same recording, so a handle kept outside the session can
/// inspect what the session attached.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.inner.lock().map(|r| r.live.len()).unwrap_or(0)
    }

    pub fn live_node(&self, id: NodeId) -> Option<RecordedNode> {
        self.inner
            .lock()
            .ok()
            .and_then(|r| r.live.get(&id).cloned())
    }

    /// (added, updated, removed) totals since creation.
    pub fn totals(&self) -> (usize, usize, usize) {
        self.inner
            .lock()
            .map(|r| (r.added, r.updated, r.removed))
            .unwrap_or((0, 0, 0))
    }
}

impl SceneGraph for RecordingScene {
    fn add_node(&mut self, id: NodeId, node: &SceneNode) {
        if let Ok(mut recording) = self.inner.lock() {
            recording.live.insert(id, RecordedNode::from_node(node));
            recording.added += 1;
        }
    }

    fn update_node(&mut self, id: NodeId, node: &SceneNode) {
        if let Ok(mut recording) = self.inner.lock() {
            if let Some(entry) = recording.live.get_mut(&id) {
                *entry = RecordedNode::from_node(node);
                recording.updated += 1;
            }
        }
    }

    fn remove_node(&mut self, id: NodeId) {
        if let Ok(mut recording) = self.inner.lock() {
            if recording.live.remove(&id).is_some() {
                recording.removed += 1;
            }
        }
    }
}
