pub mod geodesy;
pub mod pose;

pub use geodesy::GeodesyHelper;
pub use pose::{CameraFrame, CameraPose};
