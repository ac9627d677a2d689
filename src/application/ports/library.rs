//! Recordings library port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::recording::Recording;

/// Library errors
#[derive(Debug, Clone, Error)]
pub enum LibraryError {
    #[error("Failed to read recordings directory: {0}")]
    ReadFailed(String),
}

/// Port for listing saved recordings
#[async_trait]
pub trait RecordingLibrary: Send + Sync {
    /// All recordings, newest first
    async fn list(&self) -> Result<Vec<Recording>, LibraryError>;
}
