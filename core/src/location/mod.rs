pub mod source;

pub use source::{LocationFeed, LocationSource, LocationStream};
