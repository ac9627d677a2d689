//! OS signal handling for the daemon

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Requests raised by OS signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSignal {
    /// Toggle recording (SIGUSR1)
    Toggle,
    /// Shutdown daemon (SIGINT/SIGTERM)
    Shutdown,
}

/// Daemon signal handler
///
/// Forwards SIGINT and SIGTERM as shutdown requests and SIGUSR1 as a
/// toggle, so a hotkey daemon can drive recording with `kill -USR1`.
pub struct DaemonSignalHandler {
    receiver: mpsc::Receiver<DaemonSignal>,
}

impl DaemonSignalHandler {
    /// Install the handlers and start forwarding signals
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(10);

        for (kind, name, forwarded) in [
            (SignalKind::interrupt(), "SIGINT", DaemonSignal::Shutdown),
            (SignalKind::terminate(), "SIGTERM", DaemonSignal::Shutdown),
            (SignalKind::user_defined1(), "SIGUSR1", DaemonSignal::Toggle),
        ] {
            let mut stream = signal(kind)?;
            let tx = tx.clone();
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    tracing::info!(signal = name, "Signal received");
                    if tx.send(forwarded).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(Self { receiver: rx })
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<DaemonSignal> {
        self.receiver.recv().await
    }
}
