//! Test doubles for the session controller
//!
//! Recorder and player stand in for the audio hardware. Focus, proximity
//! and the library are the real in-process adapters.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::task::JoinHandle;

use voice_memo::application::ports::{
    PermissionGate, PlaybackCallbacks, PlaybackEnd, PlaybackEngine, PlaybackError,
    RecordingEngine, RecordingError,
};
use voice_memo::application::{spawn_session, SessionConfig, SessionEngines, SessionHandle};
use voice_memo::domain::recording::RecordingClock;
use voice_memo::domain::session::{OutputRoute, SessionSnapshot};
use voice_memo::infrastructure::{
    AlwaysGranted, FsRecordingLibrary, LocalFocusBroker, VirtualProximitySensor,
};

pub const SENSOR_RANGE: f32 = 5.0;
pub const WAIT: StdDuration = StdDuration::from_secs(2);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
struct RecorderState {
    active: Option<PathBuf>,
    starts: Vec<PathBuf>,
    stops: usize,
    fail_next_start: Option<RecordingError>,
    fail_next_stop: Option<RecordingError>,
}

/// Recorder writing a small placeholder file on stop
#[derive(Clone)]
pub struct MockRecorder {
    dir: PathBuf,
    clock: Arc<RecordingClock>,
    state: Arc<Mutex<RecorderState>>,
}

impl MockRecorder {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            clock: Arc::new(RecordingClock::new()),
            state: Arc::default(),
        }
    }

    pub fn fail_next_start(&self, error: RecordingError) {
        lock(&self.state).fail_next_start = Some(error);
    }

    pub fn fail_next_stop(&self, error: RecordingError) {
        lock(&self.state).fail_next_stop = Some(error);
    }

    pub fn active(&self) -> Option<PathBuf> {
        lock(&self.state).active.clone()
    }

    pub fn starts(&self) -> Vec<PathBuf> {
        lock(&self.state).starts.clone()
    }

    pub fn stops(&self) -> usize {
        lock(&self.state).stops
    }
}

#[async_trait]
impl RecordingEngine for MockRecorder {
    async fn start(&self) -> Result<PathBuf, RecordingError> {
        let mut state = lock(&self.state);
        if let Some(path) = &state.active {
            return Ok(path.clone());
        }
        if let Some(error) = state.fail_next_start.take() {
            return Err(error);
        }
        let path = self.clock.next_name_now().path_in(&self.dir);
        state.active = Some(path.clone());
        state.starts.push(path.clone());
        Ok(path)
    }

    async fn stop(&self) -> Result<PathBuf, RecordingError> {
        let path = {
            let mut state = lock(&self.state);
            let path = state.active.take().ok_or(RecordingError::NotRecording)?;
            state.stops += 1;
            if let Some(error) = state.fail_next_stop.take() {
                return Err(error);
            }
            path
        };
        std::fs::write(&path, b"fLaC").map_err(|e| RecordingError::WriteFailed(e.to_string()))?;
        Ok(path)
    }
}

struct Playing {
    path: PathBuf,
    route: OutputRoute,
    callbacks: PlaybackCallbacks,
}

#[derive(Default)]
struct PlayerState {
    current: Option<Playing>,
    plays: Vec<PathBuf>,
    reroutes: Vec<OutputRoute>,
    stops: usize,
    position_ms: u64,
    fail_next_play: Option<PlaybackError>,
    fail_next_reroute: Option<PlaybackError>,
}

/// Player that plays until told to finish
#[derive(Clone, Default)]
pub struct MockPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position_ms(&self, position_ms: u64) {
        lock(&self.state).position_ms = position_ms;
    }

    pub fn fail_next_play(&self, error: PlaybackError) {
        lock(&self.state).fail_next_play = Some(error);
    }

    pub fn fail_next_reroute(&self, error: PlaybackError) {
        lock(&self.state).fail_next_reroute = Some(error);
    }

    /// Simulate the stream reaching the end of the file
    pub fn finish(&self) {
        let current = lock(&self.state).current.take();
        if let Some(playing) = current {
            playing.callbacks.complete(PlaybackEnd::Completed);
        }
    }

    /// Simulate a device failure mid-stream
    pub fn break_stream(&self, error: PlaybackError) {
        let current = lock(&self.state).current.take();
        if let Some(playing) = current {
            playing.callbacks.fail(error);
        }
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        lock(&self.state).current.as_ref().map(|p| p.path.clone())
    }

    pub fn current_route(&self) -> Option<OutputRoute> {
        lock(&self.state).current.as_ref().map(|p| p.route)
    }

    pub fn plays(&self) -> Vec<PathBuf> {
        lock(&self.state).plays.clone()
    }

    pub fn reroutes(&self) -> Vec<OutputRoute> {
        lock(&self.state).reroutes.clone()
    }

    pub fn stops(&self) -> usize {
        lock(&self.state).stops
    }
}

#[async_trait]
impl PlaybackEngine for MockPlayer {
    async fn play(&self, path: &Path, callbacks: PlaybackCallbacks) -> Result<(), PlaybackError> {
        let (previous, result) = {
            let mut state = lock(&self.state);
            let previous = state.current.take();
            state.plays.push(path.to_path_buf());
            match state.fail_next_play.take() {
                Some(error) => (previous, Err((error, callbacks))),
                None => {
                    state.current = Some(Playing {
                        path: path.to_path_buf(),
                        route: OutputRoute::Speaker,
                        callbacks,
                    });
                    (previous, Ok(()))
                }
            }
        };

        // Callbacks run outside the lock
        if let Some(previous) = previous {
            previous.callbacks.complete(PlaybackEnd::Stopped);
        }
        result.map_err(|(error, callbacks)| {
            callbacks.disarm();
            error
        })
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        let current = {
            let mut state = lock(&self.state);
            state.stops += 1;
            state.current.take()
        };
        match current {
            Some(playing) => {
                playing.callbacks.complete(PlaybackEnd::Stopped);
                Ok(())
            }
            None => Err(PlaybackError::NotPlaying),
        }
    }

    async fn seek(&self, position_ms: u64) -> Result<(), PlaybackError> {
        let mut state = lock(&self.state);
        if state.current.is_none() {
            return Err(PlaybackError::NotPlaying);
        }
        state.position_ms = position_ms;
        Ok(())
    }

    async fn reroute(&self, route: OutputRoute) -> Result<u64, PlaybackError> {
        let failed = {
            let mut state = lock(&self.state);
            state.reroutes.push(route);
            if let Some(error) = state.fail_next_reroute.take() {
                state.current.take().map(|playing| (playing, error))
            } else {
                let position = state.position_ms;
                return match state.current.as_mut() {
                    Some(playing) => {
                        playing.route = route;
                        Ok(position)
                    }
                    None => Err(PlaybackError::NotPlaying),
                };
            }
        };

        match failed {
            Some((playing, error)) => {
                playing.callbacks.fail(error.clone());
                Err(error)
            }
            None => Err(PlaybackError::NotPlaying),
        }
    }

    async fn position_ms(&self) -> Result<u64, PlaybackError> {
        let state = lock(&self.state);
        match state.current {
            Some(_) => Ok(state.position_ms),
            None => Err(PlaybackError::NotPlaying),
        }
    }
}

/// Permission gate that never grants and counts requests
#[derive(Clone, Default)]
pub struct DenyingGate {
    requests: Arc<Mutex<usize>>,
}

impl DenyingGate {
    pub fn requests(&self) -> usize {
        *lock(&self.requests)
    }
}

#[async_trait]
impl PermissionGate for DenyingGate {
    fn is_granted(&self) -> bool {
        false
    }

    async fn request(&self) -> bool {
        *lock(&self.requests) += 1;
        false
    }
}

/// A running controller plus handles on all of its collaborators
pub struct Harness {
    pub session: SessionHandle,
    pub worker: JoinHandle<()>,
    pub recorder: MockRecorder,
    pub player: MockPlayer,
    pub focus: Arc<LocalFocusBroker>,
    pub sensor: Arc<VirtualProximitySensor>,
    pub dir: TempDir,
}

impl Harness {
    pub fn start() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::build(config, AlwaysGranted, SENSOR_RANGE)
    }

    pub fn without_sensor() -> Self {
        Self::build(SessionConfig::default(), AlwaysGranted, 0.0)
    }

    pub fn build<G: PermissionGate + 'static>(
        config: SessionConfig,
        permission: G,
        sensor_range: f32,
    ) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let recorder = MockRecorder::new(dir.path());
        let player = MockPlayer::new();
        let focus = Arc::new(LocalFocusBroker::new());
        let sensor = Arc::new(VirtualProximitySensor::unthrottled(sensor_range));

        let engines = SessionEngines {
            recorder: recorder.clone(),
            player: player.clone(),
            focus: Arc::clone(&focus),
            sensor: Arc::clone(&sensor),
            permission,
            library: FsRecordingLibrary::new(dir.path()),
        };
        let (session, worker) = spawn_session(engines, config);

        Self {
            session,
            worker,
            recorder,
            player,
            focus,
            sensor,
            dir,
        }
    }

    /// Put a finished recording in the directory
    pub fn seed_recording(&self, timestamp_ms: u64) -> PathBuf {
        let path = self.dir.path().join(format!("rec_{}.flac", timestamp_ms));
        std::fs::write(&path, b"fLaC").expect("write recording");
        path
    }

    /// Wait until every message posted so far has been handled
    pub async fn settle(&self) {
        self.session.refresh().await.expect("refresh");
    }

    /// Wait for a snapshot matching `predicate`
    pub async fn wait_for(&self, predicate: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let mut rx = self.session.subscribe();
        let snapshot = tokio::time::timeout(WAIT, rx.wait_for(predicate))
            .await
            .expect("timed out waiting for session state")
            .expect("session closed");
        snapshot.clone()
    }
}
