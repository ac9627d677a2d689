//! Audio session controller
//!
//! A single worker task owns the session state and drains the command
//! queue, so exactly one transition runs at a time. Hardware callbacks and
//! timers only post messages; stale ones are recognised by generation
//! numbers and dropped.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use super::command::{Command, Mailbox, SessionNotice, Toggled};
use super::error::SessionError;
use super::handle::SessionHandle;
use crate::application::focus::AudioFocusArbiter;
use crate::application::ports::{
    AudioFocusProvider, FocusChange, PermissionGate, PlaybackCallbacks, PlaybackEnd,
    PlaybackEngine, PlaybackError, ProximitySensor, RecordingEngine, RecordingLibrary,
};
use crate::application::proximity_router::ProximityRouter;
use crate::domain::proximity::{Proximity, ThresholdMode};
use crate::domain::recording::{Duration, Recording};
use crate::domain::session::{OutputRoute, SessionSnapshot, SessionState};

const DEFAULT_QUEUE_CAPACITY: usize = 32;
const NOTICE_CAPACITY: usize = 64;

/// Collaborators injected into the controller
pub struct SessionEngines<R, P, F, S, G, L> {
    pub recorder: R,
    pub player: P,
    pub focus: F,
    pub sensor: S,
    pub permission: G,
    pub library: L,
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Recording is stopped and saved after this long
    pub max_duration: Duration,
    /// Near/far threshold relative to the sensor range
    pub threshold: ThresholdMode,
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::default_max_recording(),
            threshold: ThresholdMode::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Start the controller worker on the current runtime.
///
/// The worker runs until `SessionHandle::shutdown` is called or every
/// handle is dropped. Either way it stops the active stream and releases
/// focus before exiting.
pub fn spawn_session<R, P, F, S, G, L>(
    engines: SessionEngines<R, P, F, S, G, L>,
    config: SessionConfig,
) -> (SessionHandle, JoinHandle<()>)
where
    R: RecordingEngine + 'static,
    P: PlaybackEngine + 'static,
    F: AudioFocusProvider + 'static,
    S: ProximitySensor + 'static,
    G: PermissionGate + 'static,
    L: RecordingLibrary + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(config.queue_capacity.max(1));
    let (mailbox, event_rx) = Mailbox::channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
    let (notice_tx, _) = broadcast::channel(NOTICE_CAPACITY);

    let controller = AudioSessionController {
        recorder: engines.recorder,
        player: engines.player,
        focus: AudioFocusArbiter::new(engines.focus),
        router: ProximityRouter::new(engines.sensor, config.threshold),
        permission: engines.permission,
        library: engines.library,
        mailbox,
        max_duration: config.max_duration,
        state: SessionState::new(),
        recordings: Vec::new(),
        recording_path: None,
        snapshot_tx,
        notice_tx: notice_tx.clone(),
        focus_grant: 0,
        playback_generation: 0,
        recording_generation: 0,
        limit_timer: None,
    };

    let worker = tokio::spawn(controller.run(command_rx, event_rx));
    let handle = SessionHandle::new(command_tx, snapshot_rx, notice_tx);
    (handle, worker)
}

struct AudioSessionController<R, P, F, S, G, L>
where
    F: AudioFocusProvider,
    S: ProximitySensor,
{
    recorder: R,
    player: P,
    focus: AudioFocusArbiter<F>,
    router: ProximityRouter<S>,
    permission: G,
    library: L,
    mailbox: Mailbox,
    max_duration: Duration,

    state: SessionState,
    recordings: Vec<Recording>,
    /// File being written while recording
    recording_path: Option<PathBuf>,

    snapshot_tx: watch::Sender<SessionSnapshot>,
    notice_tx: broadcast::Sender<SessionNotice>,

    focus_grant: u64,
    playback_generation: u64,
    recording_generation: u64,
    limit_timer: Option<JoinHandle<()>>,
}

impl<R, P, F, S, G, L> AudioSessionController<R, P, F, S, G, L>
where
    R: RecordingEngine,
    P: PlaybackEngine,
    F: AudioFocusProvider,
    S: ProximitySensor,
    G: PermissionGate,
    L: RecordingLibrary,
{
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<Command>,
    ) {
        if let Err(e) = self.refresh_recordings().await {
            tracing::warn!(error = %e, "Failed to list recordings");
        }
        self.publish();
        tracing::debug!("Session controller started");

        loop {
            // Callback events posted before a request are handled before it.
            // The mailbox keeps the event channel open while the worker runs.
            let command = tokio::select! {
                biased;
                Some(event) = events.recv() => event,
                request = commands.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            if let Command::Shutdown { reply } = command {
                self.teardown().await;
                self.publish();
                let _ = reply.send(());
                tracing::debug!("Session controller stopped");
                return;
            }
            self.handle(command).await;
            self.publish();
        }

        self.teardown().await;
        self.publish();
        tracing::debug!("Session controller stopped, all handles dropped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::StartRecording { reply } => {
                let _ = reply.send(self.start_recording().await);
            }
            Command::StopRecording { reply } => {
                let _ = reply.send(self.stop_recording().await);
            }
            Command::ToggleRecording { reply } => {
                let result = if self.state.is_recording() {
                    self.stop_recording().await.map(Toggled::Saved)
                } else {
                    self.start_recording().await.map(Toggled::Started)
                };
                let _ = reply.send(result);
            }
            Command::Play { reply } => {
                let _ = reply.send(self.play().await);
            }
            Command::StopPlayback { reply } => {
                let result = if self.state.is_playing() {
                    self.end_playback(true).await;
                    Ok(())
                } else {
                    Err(SessionError::NotPlaying)
                };
                let _ = reply.send(result);
            }
            Command::Seek { position_ms, reply } => {
                let _ = reply.send(self.seek(position_ms).await);
            }
            Command::Refresh { reply } => {
                let result = self
                    .refresh_recordings()
                    .await
                    .map(|()| self.recordings.clone());
                let _ = reply.send(result);
            }
            Command::FocusLost { grant, change } => self.focus_lost(grant, change).await,
            Command::PlaybackEnded {
                generation,
                outcome,
            } => self.playback_ended(generation, outcome).await,
            Command::ProximityChanged {
                generation,
                proximity,
            } => self.proximity_changed(generation, proximity).await,
            Command::RecordingLimitReached { generation } => self.limit_reached(generation).await,
            Command::Shutdown { reply } => {
                // handled in run
                let _ = reply.send(());
            }
        }

        debug_assert_eq!(
            self.state.focus_held(),
            !self.state.is_idle(),
            "focus must be held exactly while a stream is active"
        );
    }

    async fn start_recording(&mut self) -> Result<PathBuf, SessionError> {
        if self.state.is_recording() {
            if let Some(path) = &self.recording_path {
                return Ok(path.clone());
            }
        }

        if self.state.is_playing() {
            tracing::info!("Recording requested during playback, stopping playback");
            self.end_playback(true).await;
        }

        if !self.permission.is_granted() && !self.permission.request().await {
            return Err(self.fail(SessionError::PermissionDenied));
        }

        if !self.acquire_focus() {
            return Err(self.fail(SessionError::FocusDenied));
        }

        match self.recorder.start().await {
            Ok(path) => {
                if let Err(e) = self.state.begin_recording() {
                    tracing::error!(error = %e, "Recording started from unexpected state");
                }
                self.recording_path = Some(path.clone());
                self.arm_limit_timer();
                tracing::info!(path = %path.display(), "Recording started");
                self.notify(SessionNotice::RecordingStarted { path: path.clone() });
                Ok(path)
            }
            Err(e) => {
                self.release_focus();
                Err(self.fail(e.into()))
            }
        }
    }

    async fn stop_recording(&mut self) -> Result<PathBuf, SessionError> {
        if !self.state.is_recording() {
            return Err(SessionError::NotRecording);
        }

        self.disarm_limit_timer();
        let result = self.recorder.stop().await;
        self.recording_path = None;
        self.release_focus();

        match result {
            Ok(path) => {
                if let Err(e) = self.state.finish_recording(path.clone()) {
                    tracing::error!(error = %e, "Recording finished from unexpected state");
                }
                if let Err(e) = self.refresh_recordings().await {
                    tracing::warn!(error = %e, "Failed to refresh recordings");
                }
                tracing::info!(path = %path.display(), "Recording saved");
                self.notify(SessionNotice::RecordingSaved { path: path.clone() });
                Ok(path)
            }
            Err(e) => {
                if let Err(e) = self.state.abort_recording() {
                    tracing::error!(error = %e, "Recording aborted from unexpected state");
                }
                Err(self.fail(e.into()))
            }
        }
    }

    async fn play(&mut self) -> Result<PathBuf, SessionError> {
        if self.state.is_recording() {
            tracing::info!("Playback requested during recording, stopping recording first");
            if let Err(e) = self.stop_recording().await {
                tracing::warn!(error = %e, "Stopping recording before playback failed");
            }
        }

        if self.state.is_playing() {
            self.end_playback(true).await;
        }

        if let Err(e) = self.refresh_recordings().await {
            return Err(self.fail(e));
        }
        let Some(latest) = self.recordings.first().map(|r| r.path.clone()) else {
            return Err(self.fail(SessionError::NoRecordings));
        };

        if !self.acquire_focus() {
            return Err(self.fail(SessionError::FocusDenied));
        }

        self.playback_generation += 1;
        let generation = self.playback_generation;
        let callbacks = self.playback_callbacks(generation);

        match self.player.play(&latest, callbacks).await {
            Ok(()) => {
                if let Err(e) = self.state.begin_playback() {
                    tracing::error!(error = %e, "Playback started from unexpected state");
                }
                let mailbox = self.mailbox.clone();
                self.router.register(Arc::new(move |proximity| {
                    mailbox.post(Command::ProximityChanged {
                        generation,
                        proximity,
                    });
                }));
                tracing::info!(path = %latest.display(), "Playback started");
                self.notify(SessionNotice::PlaybackStarted {
                    path: latest.clone(),
                });
                Ok(latest)
            }
            Err(e) => {
                self.release_focus();
                Err(self.fail(e.into()))
            }
        }
    }

    /// Leave the playing state. With `stop_engine` the stream is torn down
    /// first; otherwise it already ended on its own.
    async fn end_playback(&mut self, stop_engine: bool) {
        // Callbacks of the ending stream become stale
        self.playback_generation += 1;

        if stop_engine {
            if let Err(e) = self.player.stop().await {
                tracing::debug!(error = %e, "Playback stop reported an error");
            }
        }
        self.router.unregister();
        self.release_focus();
        if let Err(e) = self.state.finish_playback() {
            tracing::error!(error = %e, "Playback finished from unexpected state");
        }
        self.notify(SessionNotice::PlaybackFinished);
    }

    async fn playback_ended(
        &mut self,
        generation: u64,
        outcome: Result<PlaybackEnd, PlaybackError>,
    ) {
        if generation != self.playback_generation || !self.state.is_playing() {
            tracing::debug!(generation, "Ignoring end of a replaced playback");
            return;
        }

        match outcome {
            Ok(end) => tracing::info!(?end, "Playback ended"),
            Err(e) => {
                tracing::error!(error = %e, "Playback failed");
                self.notify(SessionNotice::Failed {
                    message: SessionError::from(e).to_string(),
                });
            }
        }
        self.end_playback(false).await;
    }

    async fn seek(&mut self, position_ms: u64) -> Result<u64, SessionError> {
        if !self.state.is_playing() {
            return Err(SessionError::NotPlaying);
        }

        // A failed seek ends the stream through its error callback
        self.player.seek(position_ms).await?;
        let position_ms = self.player.position_ms().await?;
        tracing::debug!(position_ms, "Playback position moved");
        Ok(position_ms)
    }

    async fn proximity_changed(&mut self, generation: u64, proximity: Proximity) {
        if generation != self.playback_generation || !self.state.is_playing() {
            return;
        }

        let route = match proximity {
            Proximity::Near => OutputRoute::Earpiece,
            Proximity::Far => OutputRoute::Speaker,
        };
        if self.state.active_route() == Some(route) {
            return;
        }

        match self.player.reroute(route).await {
            Ok(position_ms) => {
                if let Err(e) = self.state.set_route(route) {
                    tracing::error!(error = %e, "Route change from unexpected state");
                    return;
                }
                tracing::info!(%route, position_ms, "Output route changed");
                self.notify(SessionNotice::RouteChanged { route, position_ms });
            }
            // A failed rebuild ends the stream through its error callback
            Err(e) => tracing::warn!(error = %e, %route, "Failed to change output route"),
        }
    }

    async fn focus_lost(&mut self, grant: u64, change: FocusChange) {
        if grant != self.focus_grant || !self.state.focus_held() {
            tracing::debug!(grant, "Ignoring focus loss of a released grant");
            return;
        }

        tracing::info!(?change, mode = %self.state.mode(), "Audio focus lost");
        if self.state.is_recording() {
            if let Err(e) = self.stop_recording().await {
                tracing::warn!(error = %e, "Failed to save interrupted recording");
            }
        } else if self.state.is_playing() {
            self.end_playback(true).await;
        } else {
            self.release_focus();
        }
        self.notify(SessionNotice::Interrupted);
    }

    async fn limit_reached(&mut self, generation: u64) {
        if generation != self.recording_generation || !self.state.is_recording() {
            return;
        }

        tracing::warn!(limit = %self.max_duration, "Max duration reached, stopping recording");
        self.notify(SessionNotice::LimitReached);
        if let Err(e) = self.stop_recording().await {
            tracing::warn!(error = %e, "Failed to save recording at time limit");
        }
    }

    async fn teardown(&mut self) {
        if self.state.is_recording() {
            if let Err(e) = self.stop_recording().await {
                tracing::warn!(error = %e, "Failed to save recording on shutdown");
            }
        }
        if self.state.is_playing() {
            self.end_playback(true).await;
        }
        self.disarm_limit_timer();
        self.router.unregister();
        self.release_focus();
    }

    fn acquire_focus(&mut self) -> bool {
        self.focus_grant += 1;
        let grant = self.focus_grant;
        let mailbox = self.mailbox.clone();
        let granted = self.focus.acquire(Arc::new(move |change| {
            mailbox.post(Command::FocusLost { grant, change });
        }));
        self.state.set_focus_held(granted);
        granted
    }

    fn release_focus(&mut self) {
        self.focus.release();
        self.state.set_focus_held(false);
    }

    fn playback_callbacks(&self, generation: u64) -> PlaybackCallbacks {
        let on_complete = self.mailbox.clone();
        let on_error = self.mailbox.clone();
        PlaybackCallbacks::new(
            Box::new(move || tracing::debug!(generation, "Playback audio started")),
            Box::new(move |end| {
                on_complete.post(Command::PlaybackEnded {
                    generation,
                    outcome: Ok(end),
                })
            }),
            Box::new(move |err| {
                on_error.post(Command::PlaybackEnded {
                    generation,
                    outcome: Err(err),
                })
            }),
        )
    }

    fn arm_limit_timer(&mut self) {
        self.disarm_limit_timer();
        self.recording_generation += 1;
        let generation = self.recording_generation;
        let limit = self.max_duration.as_std();
        let mailbox = self.mailbox.clone();
        self.limit_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            mailbox.post(Command::RecordingLimitReached { generation });
        }));
    }

    fn disarm_limit_timer(&mut self) {
        if let Some(timer) = self.limit_timer.take() {
            timer.abort();
        }
    }

    async fn refresh_recordings(&mut self) -> Result<(), SessionError> {
        self.recordings = self.library.list().await?;
        Ok(())
    }

    fn publish(&self) {
        let snapshot = SessionSnapshot::capture(&self.state, &self.recordings);
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn notify(&self, notice: SessionNotice) {
        // No receivers is fine
        let _ = self.notice_tx.send(notice);
    }

    /// Report a failed request and hand the error back
    fn fail(&self, error: SessionError) -> SessionError {
        tracing::error!(error = %error, "Session request failed");
        self.notify(SessionNotice::Failed {
            message: error.to_string(),
        });
        error
    }
}

