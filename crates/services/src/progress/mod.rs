mod engine;
mod state;

// Public API of the progress subsystem.
pub use crate::error::ProgressError;
pub use engine::{ProgressEngine, SyncOutcome};
