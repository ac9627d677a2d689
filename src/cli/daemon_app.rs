//! Daemon app runner

use std::process::ExitCode;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::application::ports::{ConfigStore, NotificationIcon, Notifier};
use crate::application::{
    spawn_session, SessionConfig, SessionEngines, SessionNotice, ThemeScheduler,
};
use crate::domain::recording::Duration;
use crate::infrastructure::{
    create_notifier, CpalRecordingEngine, DevicePermissionGate, FsRecordingLibrary,
    LocalFocusBroker, OutputDevices, RodioPlaybackEngine, SharedThemeSink,
    VirtualProximitySensor, XdgConfigStore,
};

use super::app::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::args::ServeOptions;
use super::ipc::{create_ipc_server, CommandRouter};
use super::pid_file::PidFile;
use super::presenter::Presenter;
use super::signals::{DaemonSignal, DaemonSignalHandler};

const NOTIFICATION_TITLE: &str = "Voice Memo";

/// Run the session daemon until SIGINT/SIGTERM
pub async fn run_serve(options: ServeOptions) -> ExitCode {
    let presenter = Presenter::new();
    let config = XdgConfigStore::new().load_merged(options.to_config()).await;

    let max_duration = match config.max_duration.as_deref().map(str::parse::<Duration>) {
        Some(Ok(duration)) => duration,
        Some(Err(e)) => {
            presenter.error(&format!("Invalid max-duration: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => Duration::default_max_recording(),
    };

    let pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let recordings_dir = config.recordings_dir_or_default();
    let devices = OutputDevices::new(
        config.speaker_device().map(str::to_string),
        config.earpiece_device().map(str::to_string),
    );
    let player = match RodioPlaybackEngine::new(devices) {
        Ok(player) => player,
        Err(e) => {
            presenter.error(&format!("Failed to start playback engine: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let focus = Arc::new(LocalFocusBroker::new());
    let sensor = Arc::new(VirtualProximitySensor::new(config.sensor_max_range_or_default()));

    let engines = SessionEngines {
        recorder: CpalRecordingEngine::new(&recordings_dir),
        player,
        focus: Arc::clone(&focus),
        sensor: Arc::clone(&sensor),
        permission: DevicePermissionGate::new(&recordings_dir),
        library: FsRecordingLibrary::new(&recordings_dir),
    };
    let session_config = SessionConfig {
        max_duration,
        threshold: config.threshold_or_default(),
        ..Default::default()
    };
    let (session, worker) = spawn_session(engines, session_config);

    match session.refresh().await {
        Ok(recordings) => tracing::info!(count = recordings.len(), "Recordings loaded"),
        Err(e) => presenter.warn(&e.to_string()),
    }

    let notice_task = spawn_notice_listener(
        session.notices(),
        create_notifier(config.notify_or_default()),
        presenter,
    );

    let theme = Arc::new(SharedThemeSink::new());
    let theme_task = if config.auto_theme_or_default() {
        let scheduler = Arc::new(ThemeScheduler::new(Arc::clone(&theme)));
        Some(scheduler.schedule_next_switch())
    } else {
        None
    };

    let mut signals = match DaemonSignalHandler::new() {
        Ok(signals) => signals,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut server = create_ipc_server();
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind socket: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    let socket = server.path();
    let router = Arc::new(CommandRouter::new(session.clone(), sensor, focus, theme));
    // Dropping the server on abort removes the socket file
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(router).await {
            tracing::error!(error = %e, "Control socket stopped");
        }
    });

    presenter.daemon_status("Started, waiting for commands...");
    presenter.info(&format!(
        "PID: {} | Socket: {} | Recordings: {}",
        std::process::id(),
        socket,
        recordings_dir.display()
    ));

    loop {
        match signals.recv().await {
            Some(DaemonSignal::Toggle) => {
                if let Err(e) = session.toggle_recording().await {
                    presenter.error(&e.to_string());
                }
            }
            Some(DaemonSignal::Shutdown) | None => break,
        }
    }

    presenter.daemon_status("Shutting down...");
    server_task.abort();
    if let Some(task) = theme_task {
        task.abort();
    }

    let clean = session.shutdown().await.is_ok() && worker.await.is_ok();
    notice_task.abort();
    let _ = pid_file.release();

    if clean {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Echo session notices to the terminal and as desktop notifications
fn spawn_notice_listener(
    mut notices: broadcast::Receiver<SessionNotice>,
    notifier: Box<dyn Notifier>,
    presenter: Presenter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let notice = match notices.recv().await {
                Ok(notice) => notice,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notice listener fell behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            presenter.notice(&notice);
            if let Some((message, icon)) = toast_for(&notice) {
                if let Err(e) = notifier.notify(NOTIFICATION_TITLE, &message, icon).await {
                    tracing::debug!(error = %e, "Notification not shown");
                }
            }
        }
    })
}

/// Toast text for notices worth interrupting the user for
fn toast_for(notice: &SessionNotice) -> Option<(String, NotificationIcon)> {
    let toast = match notice {
        SessionNotice::RecordingStarted { .. } => {
            ("Recording...".to_string(), NotificationIcon::Recording)
        }
        SessionNotice::RecordingSaved { path } => (
            format!("Saved {}", file_name(path)),
            NotificationIcon::Success,
        ),
        SessionNotice::PlaybackStarted { path } => (
            format!("Playing {}", file_name(path)),
            NotificationIcon::Playing,
        ),
        SessionNotice::Interrupted => (
            "Stopped by another app".to_string(),
            NotificationIcon::Warning,
        ),
        SessionNotice::LimitReached => (
            "Recording limit reached".to_string(),
            NotificationIcon::Warning,
        ),
        SessionNotice::Failed { message } => (message.clone(), NotificationIcon::Error),
        SessionNotice::PlaybackFinished | SessionNotice::RouteChanged { .. } => return None,
    };
    Some(toast)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
