//! Client side of the session controller

use std::path::PathBuf;

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::command::{Command, Reply, SessionNotice, Toggled};
use super::error::SessionError;
use crate::domain::recording::Recording;
use crate::domain::session::SessionSnapshot;

/// Cloneable handle for sending requests to the session worker.
///
/// Every request waits for the transitions queued before it.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    notices: broadcast::Sender<SessionNotice>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        snapshots: watch::Receiver<SessionSnapshot>,
        notices: broadcast::Sender<SessionNotice>,
    ) -> Self {
        Self {
            commands,
            snapshots,
            notices,
        }
    }

    /// Start recording into a new file.
    ///
    /// Playback is torn down first. Returns the file being written; when
    /// already recording, the file of the active recording.
    pub async fn start_recording(&self) -> Result<PathBuf, SessionError> {
        self.request(|reply| Command::StartRecording { reply }).await
    }

    /// Stop recording and return the saved file
    pub async fn stop_recording(&self) -> Result<PathBuf, SessionError> {
        self.request(|reply| Command::StopRecording { reply }).await
    }

    /// Stop if recording, otherwise start
    pub async fn toggle_recording(&self) -> Result<Toggled, SessionError> {
        self.request(|reply| Command::ToggleRecording { reply }).await
    }

    /// Play the most recent recording on the speaker.
    ///
    /// An active recording is stopped and saved first.
    pub async fn play(&self) -> Result<PathBuf, SessionError> {
        self.request(|reply| Command::Play { reply }).await
    }

    pub async fn stop_playback(&self) -> Result<(), SessionError> {
        self.request(|reply| Command::StopPlayback { reply }).await
    }

    /// Jump within the current playback.
    ///
    /// Returns the position playback continues from, in milliseconds.
    pub async fn seek(&self, position_ms: u64) -> Result<u64, SessionError> {
        self.request(|reply| Command::Seek { position_ms, reply }).await
    }

    /// Re-read the recordings directory
    pub async fn refresh(&self) -> Result<Vec<Recording>, SessionError> {
        self.request(|reply| Command::Refresh { reply }).await
    }

    /// Stop any active stream, release focus and end the worker
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown { reply })
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        rx.await.map_err(|_| SessionError::ControllerClosed)
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Receiver for transient session events
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::ControllerClosed)?;
        rx.await.unwrap_or(Err(SessionError::ControllerClosed))
    }
}
