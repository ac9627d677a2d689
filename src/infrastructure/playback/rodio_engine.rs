//! Recording playback using rodio
//!
//! rodio's OutputStream is not Send, so a dedicated thread owns the stream
//! and sink and serves requests over a channel. Between requests it polls
//! the sink to detect the natural end of the file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::oneshot;

use super::clock::PlaybackClock;
use super::devices::OutputDevices;
use crate::application::ports::{PlaybackCallbacks, PlaybackEnd, PlaybackEngine, PlaybackError};
use crate::domain::session::OutputRoute;

/// How often the worker checks for the end of the stream
const COMPLETION_POLL: Duration = Duration::from_millis(50);

type Reply<T> = oneshot::Sender<Result<T, PlaybackError>>;

enum Request {
    Play {
        path: PathBuf,
        callbacks: PlaybackCallbacks,
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<()>,
    },
    Seek {
        position: Duration,
        reply: Reply<()>,
    },
    Reroute {
        route: OutputRoute,
        reply: Reply<u64>,
    },
    Position {
        reply: Reply<u64>,
    },
}

/// Stream and sink for one route. The stream must outlive the sink.
struct Pipeline {
    sink: Sink,
    _stream: OutputStream,
}

impl Pipeline {
    fn open(
        devices: &OutputDevices,
        path: &Path,
        route: OutputRoute,
        start_at: Duration,
    ) -> Result<Self, PlaybackError> {
        let file = File::open(path).map_err(|e| PlaybackError::OpenFailed(e.to_string()))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| PlaybackError::DecodeFailed(e.to_string()))?;

        let (stream, handle) = devices.open(route)?;
        let sink =
            Sink::try_new(&handle).map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;
        sink.append(decoder.skip_duration(start_at));

        Ok(Self {
            sink,
            _stream: stream,
        })
    }

    fn teardown(self) {
        self.sink.stop();
    }
}

struct Current {
    path: PathBuf,
    route: OutputRoute,
    pipeline: Pipeline,
    clock: PlaybackClock,
    callbacks: PlaybackCallbacks,
}

struct Worker {
    devices: OutputDevices,
    current: Option<Current>,
}

impl Worker {
    fn run(mut self, requests: mpsc::Receiver<Request>) {
        loop {
            match requests.recv_timeout(COMPLETION_POLL) {
                Ok(request) => self.handle(request),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.finish(PlaybackEnd::Stopped);
                    return;
                }
            }

            if self
                .current
                .as_ref()
                .is_some_and(|current| current.pipeline.sink.empty())
            {
                tracing::debug!("Playback reached end of file");
                self.finish(PlaybackEnd::Completed);
            }
        }
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Play {
                path,
                callbacks,
                reply,
            } => {
                let _ = reply.send(self.play(path, callbacks));
            }
            Request::Stop { reply } => {
                let result = if self.current.is_some() {
                    self.finish(PlaybackEnd::Stopped);
                    Ok(())
                } else {
                    Err(PlaybackError::NotPlaying)
                };
                let _ = reply.send(result);
            }
            Request::Seek { position, reply } => {
                let result = match self.current.as_ref().map(|current| current.route) {
                    Some(route) => self.rebuild(route, position).map(|_| ()),
                    None => Err(PlaybackError::NotPlaying),
                };
                let _ = reply.send(result);
            }
            Request::Reroute { route, reply } => {
                let _ = reply.send(self.reroute(route));
            }
            Request::Position { reply } => {
                let result = self
                    .current
                    .as_ref()
                    .map(|current| current.clock.position().as_millis() as u64)
                    .ok_or(PlaybackError::NotPlaying);
                let _ = reply.send(result);
            }
        }
    }

    fn play(
        &mut self,
        path: PathBuf,
        mut callbacks: PlaybackCallbacks,
    ) -> Result<(), PlaybackError> {
        self.finish(PlaybackEnd::Stopped);

        let pipeline = match Pipeline::open(&self.devices, &path, OutputRoute::Speaker, Duration::ZERO) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                callbacks.disarm();
                return Err(e);
            }
        };

        callbacks.started();
        self.current = Some(Current {
            path,
            route: OutputRoute::Speaker,
            pipeline,
            clock: PlaybackClock::starting_at(Duration::ZERO),
            callbacks,
        });
        Ok(())
    }

    fn reroute(&mut self, route: OutputRoute) -> Result<u64, PlaybackError> {
        let devices = &self.devices;
        let Some(current) = self.current.as_mut() else {
            return Err(PlaybackError::NotPlaying);
        };
        let position = current.clock.position();

        // Both routes play through the same device, e.g. a headset set as default
        if devices.shares_output(current.route, route) {
            tracing::debug!(from = %current.route, to = %route, "Routes share an output, keeping pipeline");
            current.route = route;
            return Ok(position.as_millis() as u64);
        }
        self.rebuild(route, position)
    }

    /// Tear down the current pipeline and rebuild it on `route` at
    /// `position`. A failed rebuild ends the playback with an error.
    fn rebuild(&mut self, route: OutputRoute, position: Duration) -> Result<u64, PlaybackError> {
        let Some(current) = self.current.take() else {
            return Err(PlaybackError::NotPlaying);
        };
        let Current {
            path,
            route: previous_route,
            pipeline,
            callbacks,
            ..
        } = current;

        pipeline.teardown();

        match Pipeline::open(&self.devices, &path, route, position) {
            Ok(pipeline) => {
                tracing::debug!(
                    from = %previous_route,
                    to = %route,
                    position_ms = position.as_millis() as u64,
                    "Playback pipeline rebuilt"
                );
                self.current = Some(Current {
                    path,
                    route,
                    pipeline,
                    clock: PlaybackClock::starting_at(position),
                    callbacks,
                });
                Ok(position.as_millis() as u64)
            }
            Err(e) => {
                callbacks.fail(e.clone());
                Err(e)
            }
        }
    }

    fn finish(&mut self, end: PlaybackEnd) {
        if let Some(current) = self.current.take() {
            current.pipeline.teardown();
            current.callbacks.complete(end);
        }
    }
}

/// Single-stream playback engine backed by a rodio worker thread
pub struct RodioPlaybackEngine {
    requests: mpsc::Sender<Request>,
}

impl RodioPlaybackEngine {
    /// Start the playback worker
    pub fn new(devices: OutputDevices) -> Result<Self, PlaybackError> {
        let (requests, receiver) = mpsc::channel();
        std::thread::Builder::new()
            .name("voice-memo-playback".into())
            .spawn(move || {
                let worker = Worker {
                    devices,
                    current: None,
                };
                worker.run(receiver)
            })
            .map_err(|e| PlaybackError::OutputUnavailable(e.to_string()))?;

        Ok(Self { requests })
    }

    async fn call<T>(&self, request: impl FnOnce(Reply<T>) -> Request) -> Result<T, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .send(request(reply))
            .map_err(|_| PlaybackError::EngineGone)?;
        rx.await.unwrap_or(Err(PlaybackError::EngineGone))
    }
}

#[async_trait]
impl PlaybackEngine for RodioPlaybackEngine {
    async fn play(&self, path: &Path, callbacks: PlaybackCallbacks) -> Result<(), PlaybackError> {
        let path = path.to_path_buf();
        self.call(|reply| Request::Play {
            path,
            callbacks,
            reply,
        })
        .await
    }

    async fn stop(&self) -> Result<(), PlaybackError> {
        self.call(|reply| Request::Stop { reply }).await
    }

    async fn seek(&self, position_ms: u64) -> Result<(), PlaybackError> {
        let position = Duration::from_millis(position_ms);
        self.call(|reply| Request::Seek { position, reply }).await
    }

    async fn reroute(&self, route: OutputRoute) -> Result<u64, PlaybackError> {
        self.call(|reply| Request::Reroute { route, reply }).await
    }

    async fn position_ms(&self) -> Result<u64, PlaybackError> {
        self.call(|reply| Request::Position { reply }).await
    }
}
