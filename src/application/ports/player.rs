//! Playback engine port

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::OutputRoute;

/// Playback errors
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Nothing is playing")]
    NotPlaying,

    #[error("Audio output unavailable: {0}")]
    OutputUnavailable(String),

    #[error("Failed to open recording: {0}")]
    OpenFailed(String),

    #[error("Failed to decode recording: {0}")]
    DecodeFailed(String),

    #[error("Playback engine stopped")]
    EngineGone,
}

/// How a successful playback ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Reached the end of the file
    Completed,
    /// Stopped or replaced by another `play`
    Stopped,
}

pub type StartCallback = Box<dyn FnOnce() + Send>;
pub type CompleteCallback = Box<dyn FnOnce(PlaybackEnd) + Send>;
pub type ErrorCallback = Box<dyn FnOnce(PlaybackError) + Send>;

/// Callbacks for a single `play` call.
///
/// `complete` and `fail` consume the value, so at most one of them runs.
/// Dropping an armed value reports `PlaybackEnd::Stopped`, so a started
/// playback always reports exactly once. Engines call `disarm` when `play`
/// itself fails.
pub struct PlaybackCallbacks {
    on_start: Option<StartCallback>,
    on_complete: Option<CompleteCallback>,
    on_error: Option<ErrorCallback>,
}

impl PlaybackCallbacks {
    pub fn new(on_start: StartCallback, on_complete: CompleteCallback, on_error: ErrorCallback) -> Self {
        Self {
            on_start: Some(on_start),
            on_complete: Some(on_complete),
            on_error: Some(on_error),
        }
    }

    /// Callbacks that do nothing
    pub fn noop() -> Self {
        Self::new(Box::new(|| {}), Box::new(|_| {}), Box::new(|_| {}))
    }

    /// Report that audio started. Only the first call has an effect.
    pub fn started(&mut self) {
        if let Some(on_start) = self.on_start.take() {
            on_start();
        }
    }

    /// Report a normal end
    pub fn complete(mut self, end: PlaybackEnd) {
        self.on_error = None;
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(end);
        }
    }

    /// Report a failure
    pub fn fail(mut self, error: PlaybackError) {
        self.on_complete = None;
        if let Some(on_error) = self.on_error.take() {
            on_error(error);
        }
    }

    /// Drop without reporting anything
    pub fn disarm(mut self) {
        self.on_start = None;
        self.on_complete = None;
        self.on_error = None;
    }
}

impl Drop for PlaybackCallbacks {
    fn drop(&mut self) {
        self.on_error = None;
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(PlaybackEnd::Stopped);
        }
    }
}

impl fmt::Debug for PlaybackCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCallbacks")
            .field("armed", &self.on_complete.is_some())
            .finish()
    }
}

/// Port for single-stream playback of recording files
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Play a file on the speaker route, replacing any current playback.
    async fn play(&self, path: &Path, callbacks: PlaybackCallbacks) -> Result<(), PlaybackError>;

    /// Stop the current playback. The active callbacks report `Stopped`.
    async fn stop(&self) -> Result<(), PlaybackError>;

    /// Jump to a position in the current playback
    async fn seek(&self, position_ms: u64) -> Result<(), PlaybackError>;

    /// Rebuild the pipeline on another route and resume where it was.
    ///
    /// # Returns
    /// The position playback resumed at, in milliseconds
    async fn reroute(&self, route: OutputRoute) -> Result<u64, PlaybackError>;

    /// Current position in milliseconds
    async fn position_ms(&self) -> Result<u64, PlaybackError>;
}
