//! Domain layer - Core business logic
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on audio hardware or the OS.

pub mod config;
pub mod error;
pub mod proximity;
pub mod recording;
pub mod session;
pub mod theme;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use proximity::{Proximity, ProximityClassifier, ThresholdMode};
pub use recording::{Duration, Recording, RecordingClock, RecordingName};
pub use session::{OutputRoute, SessionMode, SessionSnapshot, SessionState};
pub use theme::Theme;
