//! Audio session controller
//!
//! Sequences focus, recording, playback and output routing for a single
//! session. See [`spawn_session`].

mod command;
mod controller;
mod error;
mod handle;

pub use command::{SessionNotice, Toggled};
pub use controller::{spawn_session, SessionConfig, SessionEngines};
pub use error::SessionError;
pub use handle::SessionHandle;
