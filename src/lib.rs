//! Voice Memo - a voice memo recorder and player
//!
//! A daemon owns one audio session: it records the microphone to FLAC
//! files, plays the most recent one back, and moves playback between the
//! speaker and the earpiece as the listener approaches the device. Audio
//! focus is shared with other clients, and the UI theme follows the time
//! of day.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Value objects, the session state machine, and errors
//! - **Application**: The session controller, its collaborators, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, notify-rust, filesystem)
//! - **CLI**: Command-line interface, control socket, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
