//! Observable session snapshot for the presentation layer

use serde::{Deserialize, Serialize};

use super::state::{OutputRoute, SessionMode, SessionState};
use crate::domain::recording::Recording;

/// What the UI renders: published after every transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub recording: bool,
    pub playing: bool,
    pub route: Option<OutputRoute>,
    /// Known recordings, newest first
    pub recordings: Vec<Recording>,
}

impl SessionSnapshot {
    /// Build a snapshot from the controller's state and library listing
    pub fn capture(state: &SessionState, recordings: &[Recording]) -> Self {
        Self {
            recording: state.is_recording(),
            playing: state.is_playing(),
            route: state.active_route(),
            recordings: recordings.to_vec(),
        }
    }

    /// Session mode implied by the snapshot flags
    pub fn mode(&self) -> SessionMode {
        match (self.recording, self.route) {
            (true, _) => SessionMode::Recording,
            (false, Some(route)) if self.playing => SessionMode::Playing(route),
            _ => SessionMode::Idle,
        }
    }
}
