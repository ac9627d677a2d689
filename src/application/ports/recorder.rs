//! Recording engine port

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Recording errors
#[derive(Debug, Clone, Error)]
pub enum RecordingError {
    #[error("No recording in progress")]
    NotRecording,

    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("No audio data captured")]
    NoAudioCaptured,

    #[error("Failed to encode recording: {0}")]
    EncodingFailed(String),

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),
}

/// Port for microphone capture into recording files
#[async_trait]
pub trait RecordingEngine: Send + Sync {
    /// Start capturing into a new file.
    ///
    /// Starting while already recording returns the existing path.
    ///
    /// # Returns
    /// The path the recording will be saved to
    async fn start(&self) -> Result<PathBuf, RecordingError>;

    /// Stop capturing, finalize the file and release the device.
    ///
    /// # Returns
    /// The saved file, or `NotRecording` when idle
    async fn stop(&self) -> Result<PathBuf, RecordingError>;
}
