//! Messages drained by the session worker

use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::error::SessionError;
use crate::application::ports::{FocusChange, PlaybackEnd, PlaybackError};
use crate::domain::proximity::Proximity;
use crate::domain::recording::Recording;
use crate::domain::session::OutputRoute;

pub(crate) type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Result of the record button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Started(PathBuf),
    Saved(PathBuf),
}

pub(crate) enum Command {
    StartRecording { reply: Reply<PathBuf> },
    StopRecording { reply: Reply<PathBuf> },
    ToggleRecording { reply: Reply<Toggled> },
    Play { reply: Reply<PathBuf> },
    StopPlayback { reply: Reply<()> },
    Seek { position_ms: u64, reply: Reply<u64> },
    Refresh { reply: Reply<Vec<Recording>> },
    Shutdown { reply: oneshot::Sender<()> },

    // Posted by hardware callbacks and timers
    FocusLost {
        grant: u64,
        change: FocusChange,
    },
    PlaybackEnded {
        generation: u64,
        outcome: Result<PlaybackEnd, PlaybackError>,
    },
    ProximityChanged {
        generation: u64,
        proximity: Proximity,
    },
    RecordingLimitReached {
        generation: u64,
    },
}

/// Transient events for notifications and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionNotice {
    RecordingStarted { path: PathBuf },
    RecordingSaved { path: PathBuf },
    PlaybackStarted { path: PathBuf },
    PlaybackFinished,
    RouteChanged { route: OutputRoute, position_ms: u64 },
    Interrupted,
    LimitReached,
    Failed { message: String },
}

/// Posts callback messages to the worker from any thread.
///
/// Every callback shares one unbounded channel, so events are handled in
/// the order they were posted. The worker drains it ahead of requests.
#[derive(Clone)]
pub(crate) struct Mailbox {
    events: mpsc::UnboundedSender<Command>,
}

impl Mailbox {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self { events }, receiver)
    }

    pub(crate) fn post(&self, command: Command) {
        // Fails only once the worker has exited
        let _ = self.events.send(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_keep_posting_order() {
        let (mailbox, mut events) = Mailbox::channel();
        let proximities = [Proximity::Near, Proximity::Far].into_iter().cycle().take(100);
        for (generation, proximity) in proximities.enumerate() {
            mailbox.post(Command::ProximityChanged {
                generation: generation as u64,
                proximity,
            });
        }

        for expected in 0..100u64 {
            match events.recv().await {
                Some(Command::ProximityChanged { generation, .. }) => assert_eq!(generation, expected),
                _ => panic!("expected proximity event {}", expected),
            }
        }
    }

    #[tokio::test]
    async fn post_after_worker_exit_is_dropped() {
        let (mailbox, events) = Mailbox::channel();
        drop(events);
        mailbox.post(Command::RecordingLimitReached { generation: 1 });
    }
}
