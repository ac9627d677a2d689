//! Playback infrastructure module

mod clock;
mod devices;
mod rodio_engine;

pub use clock::PlaybackClock;
pub use devices::OutputDevices;
pub use rodio_engine::RodioPlaybackEngine;
