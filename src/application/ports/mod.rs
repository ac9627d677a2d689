//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod focus;
pub mod library;
pub mod notifier;
pub mod permission;
pub mod player;
pub mod proximity;
pub mod recorder;
pub mod theme;

// Re-export common types
pub use config::ConfigStore;
pub use focus::{
    AudioFocusProvider, AudioUsage, FocusChange, FocusError, FocusGain, FocusListener,
    FocusRequest, FocusToken,
};
pub use library::{LibraryError, RecordingLibrary};
pub use notifier::{NotificationError, NotificationIcon, Notifier};
pub use permission::PermissionGate;
pub use player::{PlaybackCallbacks, PlaybackEnd, PlaybackEngine, PlaybackError};
pub use proximity::{ProximityReading, ProximitySensor, ReadingListener, SamplingRate, SensorError};
pub use recorder::{RecordingEngine, RecordingError};
pub use theme::ThemeSink;
