//! Dispatch of control-socket lines to the running session

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::application::ports::{FocusGain, ThemeSink};
use crate::application::{SessionHandle, Toggled};
use crate::domain::session::SessionSnapshot;
use crate::domain::theme::Theme;
use crate::infrastructure::{LocalFocusBroker, SharedThemeSink, VirtualProximitySensor};

/// One request line received on the control socket
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Record,
    Stop,
    Toggle,
    Play,
    StopPlayback,
    Seek(u64),
    Near,
    Far,
    Proximity(f32),
    Interrupt,
    Resume,
    Status,
}

/// Request line that is not a known command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}'", self.0)
    }
}

impl FromStr for ControlCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match (words.next(), words.next(), words.next()) {
            (Some("record"), None, _) => Self::Record,
            (Some("stop"), None, _) => Self::Stop,
            (Some("toggle"), None, _) => Self::Toggle,
            (Some("play"), None, _) => Self::Play,
            (Some("stop-playback"), None, _) => Self::StopPlayback,
            (Some("seek"), Some(position), None) => position
                .parse::<u64>()
                .map(Self::Seek)
                .map_err(|_| UnknownCommand(line.trim().to_string()))?,
            (Some("near"), None, _) => Self::Near,
            (Some("far"), None, _) => Self::Far,
            (Some("proximity"), Some(distance), None) => distance
                .parse::<f32>()
                .ok()
                .filter(|d| d.is_finite())
                .map(Self::Proximity)
                .ok_or_else(|| UnknownCommand(line.trim().to_string()))?,
            (Some("interrupt"), None, _) => Self::Interrupt,
            (Some("resume"), None, _) => Self::Resume,
            (Some("status"), None, _) => Self::Status,
            _ => return Err(UnknownCommand(line.trim().to_string())),
        };
        Ok(command)
    }
}

/// Reply to a `status` request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonStatus {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    /// Theme applied by the day/night scheduler, unset when it is off
    pub theme: Option<Theme>,
}

/// Routes control commands to the session and the simulated devices
pub struct CommandRouter {
    session: SessionHandle,
    sensor: Arc<VirtualProximitySensor>,
    focus: Arc<LocalFocusBroker>,
    theme: Arc<SharedThemeSink>,
}

impl CommandRouter {
    pub fn new(
        session: SessionHandle,
        sensor: Arc<VirtualProximitySensor>,
        focus: Arc<LocalFocusBroker>,
        theme: Arc<SharedThemeSink>,
    ) -> Self {
        Self {
            session,
            sensor,
            focus,
            theme,
        }
    }

    pub fn status(&self) -> DaemonStatus {
        DaemonStatus {
            session: self.session.snapshot(),
            theme: self.theme.current(),
        }
    }

    /// Handle one request line and produce the response line
    pub async fn dispatch(&self, line: &str) -> String {
        match line.parse::<ControlCommand>() {
            Ok(command) => {
                tracing::debug!(?command, "Control command");
                self.execute(command).await
            }
            Err(e) => format!("error: {}", e),
        }
    }

    async fn execute(&self, command: ControlCommand) -> String {
        let result = match command {
            ControlCommand::Record => self
                .session
                .start_recording()
                .await
                .map(|path| format!("recording {}", path.display())),
            ControlCommand::Stop => self
                .session
                .stop_recording()
                .await
                .map(|path| format!("saved {}", path.display())),
            ControlCommand::Toggle => self.session.toggle_recording().await.map(|t| match t {
                Toggled::Started(path) => format!("recording {}", path.display()),
                Toggled::Saved(path) => format!("saved {}", path.display()),
            }),
            ControlCommand::Play => self
                .session
                .play()
                .await
                .map(|path| format!("playing {}", path.display())),
            ControlCommand::StopPlayback => self
                .session
                .stop_playback()
                .await
                .map(|()| "stopped".to_string()),
            ControlCommand::Seek(position_ms) => self
                .session
                .seek(position_ms)
                .await
                .map(|position| format!("position {}", position)),
            ControlCommand::Near => Ok(delivery(self.sensor.inject_near())),
            ControlCommand::Far => Ok(delivery(self.sensor.inject_far())),
            ControlCommand::Proximity(distance) => Ok(delivery(self.sensor.inject(distance))),
            ControlCommand::Interrupt => {
                let message = if self.focus.seize_external(FocusGain::Permanent, true) {
                    "interrupted"
                } else {
                    "focus seized"
                };
                Ok(message.to_string())
            }
            ControlCommand::Resume => {
                self.focus.release_external();
                Ok("resumed".to_string())
            }
            ControlCommand::Status => {
                return serde_json::to_string(&self.status())
                    .unwrap_or_else(|e| format!("error: {}", e));
            }
        };

        match result {
            Ok(message) => format!("ok {}", message),
            Err(e) => format!("error: {}", e),
        }
    }
}

fn delivery(delivered: bool) -> String {
    let message = if delivered { "delivered" } else { "ignored" };
    message.to_string()
}
