pub mod drawing;
pub mod fix;

pub use drawing::{Coordinate, Drawing, ScenePoint};
pub use fix::LocationFix;
