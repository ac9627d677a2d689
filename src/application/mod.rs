//! Application layer - Use cases and port interfaces
//!
//! Contains the session controller and its collaborators, plus the trait
//! definitions for audio hardware and OS services.

pub mod focus;
pub mod ports;
pub mod proximity_router;
pub mod session;
pub mod theme;

// Re-export use cases
pub use focus::AudioFocusArbiter;
pub use proximity_router::ProximityRouter;
pub use session::{
    spawn_session, SessionConfig, SessionEngines, SessionError, SessionHandle, SessionNotice,
    Toggled,
};
pub use theme::ThemeScheduler;
