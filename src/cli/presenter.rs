//! CLI presenter for output formatting

use colored::*;

use crate::application::SessionNotice;
use crate::domain::recording::Recording;
use crate::domain::session::SessionMode;

use super::ipc::DaemonStatus;

/// Presenter for CLI output formatting
#[derive(Debug, Default, Clone, Copy)]
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output data to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print daemon status
    pub fn daemon_status(&self, state: &str) {
        eprintln!("{} Daemon: {}", "●".cyan(), state);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Print one line per recording, newest first
    pub fn recordings(&self, recordings: &[Recording]) {
        if recordings.is_empty() {
            self.info("No recordings yet");
            return;
        }
        for recording in recordings {
            println!("{}", format_recording(recording));
        }
    }

    /// Echo a session event from the daemon's notice stream
    pub fn notice(&self, notice: &SessionNotice) {
        match notice {
            SessionNotice::RecordingStarted { path } => {
                self.daemon_status(&format!("Recording to {}", path.display()))
            }
            SessionNotice::RecordingSaved { path } => {
                self.success(&format!("Saved {}", path.display()))
            }
            SessionNotice::PlaybackStarted { path } => {
                self.daemon_status(&format!("Playing {}", path.display()))
            }
            SessionNotice::PlaybackFinished => self.daemon_status("Idle"),
            SessionNotice::RouteChanged { route, position_ms } => {
                self.info(&format!("Output switched to {} at {}", route, format_ms(*position_ms)))
            }
            SessionNotice::Interrupted => self.warn("Interrupted by another app"),
            SessionNotice::LimitReached => self.warn("Recording limit reached, saved"),
            SessionNotice::Failed { message } => self.error(message),
        }
    }

    /// Print the reply to `daemon status`
    pub fn status(&self, status: &DaemonStatus) {
        let snapshot = &status.session;
        let mode = match snapshot.mode() {
            SessionMode::Idle => "idle".to_string(),
            SessionMode::Recording => "recording".red().to_string(),
            SessionMode::Playing(route) => format!("playing ({})", route).green().to_string(),
        };
        self.key_value("mode", &mode);
        self.key_value("recordings", &snapshot.recordings.len().to_string());
        if let Some(latest) = snapshot.recordings.first() {
            self.key_value("latest", &latest.file_name());
        }
        if let Some(theme) = status.theme {
            self.key_value("theme", &theme.to_string());
        }
    }
}

fn format_recording(recording: &Recording) -> String {
    format!(
        "{:<24} {:>10}  {}",
        recording.file_name(),
        recording.human_readable_size(),
        recording.path.display()
    )
}

/// Format milliseconds as m:ss
fn format_ms(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}
