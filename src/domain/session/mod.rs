//! Audio session domain module

mod snapshot;
mod state;

pub use snapshot::SessionSnapshot;
pub use state::{InvalidStateTransition, OutputRoute, SessionMode, SessionState};
