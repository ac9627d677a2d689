//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces, integrating
//! with audio hardware (cpal, rodio), the filesystem and the desktop.

pub mod config;
pub mod focus;
pub mod library;
pub mod notification;
pub mod permission;
pub mod playback;
pub mod proximity;
pub mod recording;
pub mod theme;

// Re-export adapters
pub use config::XdgConfigStore;
pub use focus::LocalFocusBroker;
pub use library::FsRecordingLibrary;
pub use notification::{create_notifier, NoOpNotifier, NotifyRustNotifier};
pub use permission::{AlwaysGranted, DevicePermissionGate};
pub use playback::{OutputDevices, RodioPlaybackEngine};
pub use proximity::VirtualProximitySensor;
pub use recording::CpalRecordingEngine;
pub use theme::SharedThemeSink;
