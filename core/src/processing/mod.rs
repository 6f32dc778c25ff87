pub mod curve;
pub mod geo_index;
pub mod presence;

pub use curve::CurveBuilder;
pub use geo_index::GeoIndex;
pub use presence::{PresenceController, PresenceOutcome, PresenceState};
