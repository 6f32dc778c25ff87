pub mod graph;
pub mod state;
pub mod tube;

pub use graph::{RecordedNode, RecordingScene, SceneGraph};
pub use state::{Material, NodeId, SceneNode, SceneState};
pub use tube::TubeMesh;
