pub mod orchestrator;
pub mod state;

pub use orchestrator::{ManifestOutcome, Orchestrator, Rejection, UploadOutcome};
pub use state::{Phase, SessionSnapshot, SessionState, Selections};
