//! Core of a geo-anchored AR drawing session.
//!
//! Drawings are tube curves captured in front of the camera and anchored to
//! the GPS fix at save time. While a user walks around, accepted fixes drive
//! a presence loop that materializes the first stored drawing within the
//! search radius into the scene and releases it again once out of range.

pub mod location;
pub mod math;
pub mod model;
pub mod prelude;
pub mod processing;
pub mod scene;
pub mod session;
pub mod store;
pub mod telemetry;

pub use model::{Coordinate, Drawing, LocationFix, ScenePoint};
pub use prelude::{CoreError, CoreResult, SessionConfig, TubeParams};
pub use session::{SaveOutcome, SessionEvent, SessionHandle, SessionOrchestrator, SessionSnapshot};
