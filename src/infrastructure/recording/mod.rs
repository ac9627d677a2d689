//! Recording infrastructure module
//!
//! Microphone capture with cpal, stored as 16kHz mono FLAC.

mod cpal_engine;
mod flac_encoder;
mod pcm;

pub use cpal_engine::CpalRecordingEngine;
pub use flac_encoder::{encode_to_flac, EncodingError, TARGET_SAMPLE_RATE};
