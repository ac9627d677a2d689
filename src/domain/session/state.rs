//! Audio session state machine

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Physical output a playback stream is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputRoute {
    #[default]
    Speaker,
    Earpiece,
}

impl OutputRoute {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Speaker => "speaker",
            Self::Earpiece => "earpiece",
        }
    }
}

impl fmt::Display for OutputRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session modes. Recording and playing are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionMode {
    #[default]
    Idle,
    Recording,
    Playing(OutputRoute),
}

impl SessionMode {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Playing(_) => "playing",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playing(route) => write!(f, "playing ({})", route),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current}")]
pub struct InvalidStateTransition {
    pub current: SessionMode,
    pub action: String,
}

/// Session state owned by the controller.
///
/// State machine:
///   IDLE -> RECORDING (begin_recording)
///   RECORDING -> IDLE (finish_recording, abort_recording)
///   IDLE -> PLAYING(speaker) (begin_playback)
///   PLAYING(r) -> PLAYING(r') (set_route)
///   PLAYING -> IDLE (finish_playback)
///
/// `focus_held` is bookkeeping for the arbiter's grant; the controller keeps it
/// true exactly while the mode is not idle.
#[derive(Debug, Default)]
pub struct SessionState {
    mode: SessionMode,
    current_recording: Option<PathBuf>,
    focus_held: bool,
}

impl SessionState {
    /// Create a new idle session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.mode == SessionMode::Idle
    }

    pub fn is_recording(&self) -> bool {
        self.mode == SessionMode::Recording
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, SessionMode::Playing(_))
    }

    /// Route of the active playback, if any
    pub fn active_route(&self) -> Option<OutputRoute> {
        match self.mode {
            SessionMode::Playing(route) => Some(route),
            _ => None,
        }
    }

    /// Path of the last completed recording
    pub fn current_recording(&self) -> Option<&Path> {
        self.current_recording.as_deref()
    }

    pub fn focus_held(&self) -> bool {
        self.focus_held
    }

    pub fn set_focus_held(&mut self, held: bool) {
        self.focus_held = held;
    }

    /// Transition from IDLE to RECORDING. Clears the last completed recording.
    pub fn begin_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.require_idle("start recording")?;
        self.mode = SessionMode::Recording;
        self.current_recording = None;
        Ok(())
    }

    /// Transition from RECORDING to IDLE with a saved file
    pub fn finish_recording(&mut self, path: PathBuf) -> Result<(), InvalidStateTransition> {
        self.require_recording("finish recording")?;
        self.mode = SessionMode::Idle;
        self.current_recording = Some(path);
        Ok(())
    }

    /// Transition from RECORDING to IDLE without a saved file
    pub fn abort_recording(&mut self) -> Result<(), InvalidStateTransition> {
        self.require_recording("abort recording")?;
        self.mode = SessionMode::Idle;
        Ok(())
    }

    /// Transition from IDLE to PLAYING on the speaker
    pub fn begin_playback(&mut self) -> Result<(), InvalidStateTransition> {
        self.require_idle("start playback")?;
        self.mode = SessionMode::Playing(OutputRoute::Speaker);
        Ok(())
    }

    /// Change the route of the active playback
    pub fn set_route(&mut self, route: OutputRoute) -> Result<(), InvalidStateTransition> {
        if !self.is_playing() {
            return Err(self.invalid("change route"));
        }
        self.mode = SessionMode::Playing(route);
        Ok(())
    }

    /// Transition from PLAYING to IDLE
    pub fn finish_playback(&mut self) -> Result<(), InvalidStateTransition> {
        if !self.is_playing() {
            return Err(self.invalid("finish playback"));
        }
        self.mode = SessionMode::Idle;
        Ok(())
    }

    fn require_idle(&self, action: &str) -> Result<(), InvalidStateTransition> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn require_recording(&self, action: &str) -> Result<(), InvalidStateTransition> {
        if self.is_recording() {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> InvalidStateTransition {
        InvalidStateTransition {
            current: self.mode,
            action: action.to_string(),
        }
    }
}
