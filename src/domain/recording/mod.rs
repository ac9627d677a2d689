//! Recording domain module

mod duration;
mod recording_file;

pub use duration::{Duration, DEFAULT_MAX_RECORDING_SECS};
pub use recording_file::{
    sort_newest_first, Recording, RecordingClock, RecordingName, RECORDING_EXTENSION,
    RECORDING_PREFIX,
};
