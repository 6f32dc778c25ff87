//! Session task, its command surface and the notifications it publishes.

pub mod events;
pub mod handle;
pub mod orchestrator;

pub use events::{DrawingSummary, SaveOutcome, SessionEvent, SessionSnapshot};
pub use handle::{FrameFeed, SessionCommand, SessionHandle};
pub use orchestrator::{SessionChannels, SessionInputs, SessionOrchestrator};
