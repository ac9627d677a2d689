//! Microphone capture using cpal
//!
//! cpal::Stream is not Send, so each recording owns a capture thread that
//! builds the stream, reports whether it started, and keeps it alive until
//! told to stop. Samples are buffered in memory as mono i16 and encoded to
//! FLAC at 16kHz when the recording stops.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig, SupportedStreamConfigRange};
use tokio::sync::{oneshot, Mutex};

use super::flac_encoder::{encode_to_flac, TARGET_SAMPLE_RATE};
use super::pcm;
use crate::application::ports::{RecordingEngine, RecordingError};
use crate::domain::recording::RecordingClock;

/// How often the capture thread checks for a stop request
const STOP_POLL_INTERVAL: StdDuration = StdDuration::from_millis(20);

type SampleBuffer = Arc<StdMutex<Vec<i16>>>;

struct ActiveCapture {
    path: PathBuf,
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
    buffer: SampleBuffer,
    sample_rate: u32,
}

/// Recording engine writing `rec_<ms>.flac` files into a directory
pub struct CpalRecordingEngine {
    recordings_dir: PathBuf,
    clock: RecordingClock,
    active: Mutex<Option<ActiveCapture>>,
}

impl CpalRecordingEngine {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
            clock: RecordingClock::new(),
            active: Mutex::new(None),
        }
    }

    /// Pick an input config: i16/f32 only, fewest channels, 16kHz when supported
    fn choose_input_config(
        device: &cpal::Device,
    ) -> Result<(StreamConfig, SampleFormat), RecordingError> {
        let ranges = device
            .supported_input_configs()
            .map_err(|e| RecordingError::StartFailed(format!("Failed to query input configs: {}", e)))?;

        let supports_target = |range: &SupportedStreamConfigRange| {
            range.min_sample_rate().0 <= TARGET_SAMPLE_RATE
                && range.max_sample_rate().0 >= TARGET_SAMPLE_RATE
        };

        let best = ranges
            .filter(|r| matches!(r.sample_format(), SampleFormat::I16 | SampleFormat::F32))
            .min_by_key(|r| (r.channels(), !supports_target(r)))
            .ok_or_else(|| RecordingError::StartFailed("No supported input format".into()))?;

        let rate = if supports_target(&best) {
            SampleRate(TARGET_SAMPLE_RATE)
        } else {
            best.max_sample_rate()
        };
        let format = best.sample_format();
        Ok((best.with_sample_rate(rate).config(), format))
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        format: SampleFormat,
        buffer: SampleBuffer,
    ) -> Result<cpal::Stream, RecordingError> {
        let channels = config.channels;
        let on_error = |err: cpal::StreamError| tracing::error!(error = %err, "Audio input stream error");

        let stream = match format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let mono = pcm::downmix(data, channels);
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(&mono);
                    }
                },
                on_error,
                None,
            ),
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data.iter().copied().map(pcm::f32_to_i16).collect();
                    let mono = pcm::downmix(&converted, channels);
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(&mono);
                    }
                },
                on_error,
                None,
            ),
            other => {
                return Err(RecordingError::StartFailed(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| RecordingError::StartFailed(e.to_string()))
    }

    /// Body of the capture thread. Reports the device sample rate, or the
    /// reason capture could not start, through `ready`.
    fn capture(
        running: Arc<AtomicBool>,
        buffer: SampleBuffer,
        ready: oneshot::Sender<Result<u32, RecordingError>>,
    ) {
        let setup = || -> Result<(cpal::Stream, u32), RecordingError> {
            let device = cpal::default_host()
                .default_input_device()
                .ok_or(RecordingError::NoAudioDevice)?;
            let (config, format) = Self::choose_input_config(&device)?;
            let stream = Self::build_stream(&device, &config, format, buffer)?;
            stream
                .play()
                .map_err(|e| RecordingError::StartFailed(e.to_string()))?;
            Ok((stream, config.sample_rate.0))
        };

        let stream = match setup() {
            Ok((stream, sample_rate)) => {
                if ready.send(Ok(sample_rate)).is_err() {
                    return;
                }
                stream
            }
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        while running.load(Ordering::SeqCst) {
            std::thread::sleep(STOP_POLL_INTERVAL);
        }
        drop(stream);
    }

    fn encode(samples: Vec<i16>, sample_rate: u32) -> Result<Vec<u8>, RecordingError> {
        let resampled = pcm::resample(&samples, sample_rate, TARGET_SAMPLE_RATE)
            .map_err(RecordingError::EncodingFailed)?;
        encode_to_flac(&resampled, TARGET_SAMPLE_RATE)
            .map_err(|e| RecordingError::EncodingFailed(e.to_string()))
    }

    /// Encode `samples` into the placeholder at `path`. On any failure the
    /// placeholder is removed so no unplayable file is left behind.
    async fn save(path: &Path, samples: Vec<i16>, sample_rate: u32) -> Result<(), RecordingError> {
        let result = Self::write_flac(path, samples, sample_rate).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove unfinished recording");
            }
        }
        result
    }

    async fn write_flac(path: &Path, samples: Vec<i16>, sample_rate: u32) -> Result<(), RecordingError> {
        if samples.is_empty() {
            return Err(RecordingError::NoAudioCaptured);
        }

        let bytes = tokio::task::spawn_blocking(move || Self::encode(samples, sample_rate))
            .await
            .map_err(|e| RecordingError::EncodingFailed(format!("Encode task error: {}", e)))??;

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| RecordingError::WriteFailed(e.to_string()))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Recording written");
        Ok(())
    }
}

#[async_trait]
impl RecordingEngine for CpalRecordingEngine {
    async fn start(&self) -> Result<PathBuf, RecordingError> {
        let mut active = self.active.lock().await;
        if let Some(capture) = active.as_ref() {
            return Ok(capture.path.clone());
        }

        tokio::fs::create_dir_all(&self.recordings_dir)
            .await
            .map_err(|e| RecordingError::WriteFailed(e.to_string()))?;

        let path = self.clock.next_name_now().path_in(&self.recordings_dir);
        // Reserve the name so the file exists from the start of the recording
        tokio::fs::File::create(&path)
            .await
            .map_err(|e| RecordingError::WriteFailed(e.to_string()))?;

        let running = Arc::new(AtomicBool::new(true));
        let buffer: SampleBuffer = Arc::new(StdMutex::new(Vec::new()));
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = {
            let running = Arc::clone(&running);
            let buffer = Arc::clone(&buffer);
            std::thread::Builder::new()
                .name("voice-memo-capture".into())
                .spawn(move || Self::capture(running, buffer, ready_tx))
                .map_err(|e| RecordingError::StartFailed(e.to_string()))
        };

        let started = match thread {
            Ok(thread) => match ready_rx.await {
                Ok(Ok(sample_rate)) => Ok((thread, sample_rate)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(RecordingError::StartFailed("Capture thread exited".into())),
            },
            Err(e) => Err(e),
        };

        let (thread, sample_rate) = match started {
            Ok(started) => started,
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }
        };

        tracing::debug!(path = %path.display(), sample_rate, "Microphone capture started");
        *active = Some(ActiveCapture {
            path: path.clone(),
            running,
            thread,
            buffer,
            sample_rate,
        });
        Ok(path)
    }

    async fn stop(&self) -> Result<PathBuf, RecordingError> {
        let capture = self
            .active
            .lock()
            .await
            .take()
            .ok_or(RecordingError::NotRecording)?;

        capture.running.store(false, Ordering::SeqCst);
        let thread = capture.thread;
        if tokio::task::spawn_blocking(move || thread.join())
            .await
            .map(|joined| joined.is_err())
            .unwrap_or(true)
        {
            tracing::warn!("Capture thread did not exit cleanly");
        }

        let samples = {
            let mut buffer = capture.buffer.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *buffer)
        };
        Self::save(&capture.path, samples, capture.sample_rate).await?;
        Ok(capture.path)
    }
}
