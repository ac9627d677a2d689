//! Session controller scenarios against the public API

mod common;

use std::time::Duration as StdDuration;

use tokio::sync::broadcast;

use common::{DenyingGate, Harness, SENSOR_RANGE, WAIT};
use voice_memo::application::ports::{FocusGain, PlaybackError, RecordingError};
use voice_memo::application::{SessionConfig, SessionError, SessionNotice, Toggled};
use voice_memo::domain::proximity::ThresholdMode;
use voice_memo::domain::recording::Duration;
use voice_memo::domain::session::{OutputRoute, SessionMode};

async fn next_notice(
    notices: &mut broadcast::Receiver<SessionNotice>,
    mut wanted: impl FnMut(&SessionNotice) -> bool,
) -> SessionNotice {
    tokio::time::timeout(WAIT, async {
        loop {
            let notice = notices.recv().await.expect("notice stream closed");
            if wanted(&notice) {
                return notice;
            }
        }
    })
    .await
    .expect("timed out waiting for notice")
}

/// Two recordings with distinct modification times, oldest first
async fn seed_two(harness: &Harness) -> (std::path::PathBuf, std::path::PathBuf) {
    let older = harness.seed_recording(1_000);
    tokio::time::sleep(StdDuration::from_millis(20)).await;
    let newer = harness.seed_recording(2_000);
    (older, newer)
}

#[tokio::test]
async fn stop_returns_the_path_that_was_started() {
    let h = Harness::start();

    let started = h.session.start_recording().await.unwrap();
    let snapshot = h.session.snapshot();
    assert!(snapshot.recording);
    assert!(!snapshot.playing);
    assert!(h.focus.is_held());

    let saved = h.session.stop_recording().await.unwrap();
    assert_eq!(saved, started);
    assert_eq!(h.recorder.starts(), vec![started.clone()]);
    assert!(saved.exists());

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.mode(), SessionMode::Idle);
    assert_eq!(snapshot.recordings[0].path, saved);
    assert!(!h.focus.is_held());
}

#[tokio::test]
async fn stop_while_idle_is_not_recording() {
    let h = Harness::start();
    assert_eq!(
        h.session.stop_recording().await,
        Err(SessionError::NotRecording)
    );
    assert_eq!(h.recorder.stops(), 0);
}

#[tokio::test]
async fn start_while_recording_keeps_the_same_file() {
    let h = Harness::start();

    let first = h.session.start_recording().await.unwrap();
    let second = h.session.start_recording().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(h.recorder.starts().len(), 1);
}

#[tokio::test]
async fn successive_recordings_get_increasing_names() {
    let h = Harness::start();

    let first = h.session.start_recording().await.unwrap();
    h.session.stop_recording().await.unwrap();
    let second = h.session.start_recording().await.unwrap();
    h.session.stop_recording().await.unwrap();

    assert_ne!(first, second);
    assert!(second.file_name() > first.file_name());
    let recordings = h.session.refresh().await.unwrap();
    assert_eq!(recordings[0].path, second);
}

#[tokio::test]
async fn play_with_empty_library_reports_no_recordings() {
    let h = Harness::start();
    let mut notices = h.session.notices();

    assert_eq!(h.session.play().await, Err(SessionError::NoRecordings));

    assert!(h.player.plays().is_empty());
    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
    assert!(!h.focus.is_held());
    let notice = next_notice(&mut notices, |n| matches!(n, SessionNotice::Failed { .. })).await;
    assert_eq!(
        notice,
        SessionNotice::Failed {
            message: SessionError::NoRecordings.to_string()
        }
    );
}

#[tokio::test]
async fn play_selects_most_recent_on_speaker() {
    let h = Harness::start();
    let (_, newer) = seed_two(&h).await;

    let playing = h.session.play().await.unwrap();

    assert_eq!(playing, newer);
    assert_eq!(h.player.plays(), vec![newer]);
    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.mode(), SessionMode::Playing(OutputRoute::Speaker));
    assert!(h.focus.is_held());
    assert!(h.sensor.is_subscribed());
}

#[tokio::test]
async fn play_skips_unfinished_placeholder() {
    let h = Harness::start();
    let finished = h.seed_recording(1_000);
    std::fs::write(h.dir.path().join("rec_2000.flac"), b"").unwrap();

    let playing = h.session.play().await.unwrap();

    assert_eq!(playing, finished);
    assert_eq!(h.session.snapshot().recordings.len(), 1);
}

#[tokio::test]
async fn natural_end_returns_to_idle_and_releases_everything() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let mut notices = h.session.notices();
    h.session.play().await.unwrap();

    h.player.finish();

    h.wait_for(|s| !s.playing).await;
    next_notice(&mut notices, |n| *n == SessionNotice::PlaybackFinished).await;
    assert!(!h.focus.is_held());
    assert!(!h.sensor.is_subscribed());
}

#[tokio::test]
async fn proximity_moves_playback_between_routes() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let mut notices = h.session.notices();
    h.session.play().await.unwrap();
    h.player.set_position_ms(1_234);

    assert!(h.sensor.inject_near());
    let snapshot = h.wait_for(|s| s.route == Some(OutputRoute::Earpiece)).await;
    assert!(snapshot.playing);
    let notice = next_notice(&mut notices, |n| matches!(n, SessionNotice::RouteChanged { .. })).await;
    assert_eq!(
        notice,
        SessionNotice::RouteChanged {
            route: OutputRoute::Earpiece,
            position_ms: 1_234
        }
    );
    assert_eq!(h.player.current_route(), Some(OutputRoute::Earpiece));

    assert!(h.sensor.inject_far());
    h.wait_for(|s| s.route == Some(OutputRoute::Speaker)).await;
    assert_eq!(
        h.player.reroutes(),
        vec![OutputRoute::Earpiece, OutputRoute::Speaker]
    );
}

#[tokio::test]
async fn repeated_classification_does_not_reroute() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    // Initial classification is far, so far readings change nothing
    h.sensor.inject_far();
    h.sensor.inject(SENSOR_RANGE + 1.0);
    h.settle().await;
    assert!(h.player.reroutes().is_empty());

    h.sensor.inject_near();
    h.sensor.inject(1.0);
    h.sensor.inject(0.5);
    h.settle().await;

    assert_eq!(h.player.reroutes(), vec![OutputRoute::Earpiece]);
    assert_eq!(
        h.session.snapshot().mode(),
        SessionMode::Playing(OutputRoute::Earpiece)
    );
}

#[tokio::test]
async fn readings_beyond_queue_capacity_keep_their_order() {
    let h = Harness::with_config(SessionConfig {
        queue_capacity: 1,
        ..Default::default()
    });
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    for _ in 0..20 {
        assert!(h.sensor.inject_near());
        assert!(h.sensor.inject_far());
    }
    h.settle().await;

    let expected: Vec<OutputRoute> = [OutputRoute::Earpiece, OutputRoute::Speaker]
        .into_iter()
        .cycle()
        .take(40)
        .collect();
    assert_eq!(h.player.reroutes(), expected);
    assert_eq!(
        h.session.snapshot().mode(),
        SessionMode::Playing(OutputRoute::Speaker)
    );
}

#[tokio::test]
async fn half_range_threshold_needs_a_closer_reading() {
    let h = Harness::with_config(SessionConfig {
        threshold: ThresholdMode::HalfRange,
        ..Default::default()
    });
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    h.sensor.inject(SENSOR_RANGE * 0.6);
    h.settle().await;
    assert!(h.player.reroutes().is_empty());

    h.sensor.inject(SENSOR_RANGE * 0.4);
    h.wait_for(|s| s.route == Some(OutputRoute::Earpiece)).await;
}

#[tokio::test]
async fn readings_outside_playback_are_ignored() {
    let h = Harness::start();
    h.seed_recording(1_000);

    assert!(!h.sensor.inject_near());

    h.session.play().await.unwrap();
    h.session.stop_playback().await.unwrap();
    assert!(!h.sensor.inject_near());
    h.settle().await;
    assert!(h.player.reroutes().is_empty());
}

#[tokio::test]
async fn device_without_sensor_still_plays() {
    let h = Harness::without_sensor();
    h.seed_recording(1_000);

    h.session.play().await.unwrap();
    assert!(!h.sensor.is_subscribed());
    assert!(!h.sensor.inject_near());
    assert_eq!(
        h.session.snapshot().mode(),
        SessionMode::Playing(OutputRoute::Speaker)
    );
}

#[tokio::test]
async fn failed_reroute_ends_playback() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let mut notices = h.session.notices();
    h.session.play().await.unwrap();
    h.player
        .fail_next_reroute(PlaybackError::OutputUnavailable("earpiece gone".into()));

    h.sensor.inject_near();

    h.wait_for(|s| !s.playing).await;
    next_notice(&mut notices, |n| matches!(n, SessionNotice::Failed { .. })).await;
    assert!(!h.focus.is_held());
    assert!(!h.sensor.is_subscribed());
}

#[tokio::test]
async fn stream_error_returns_to_idle() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let mut notices = h.session.notices();
    h.session.play().await.unwrap();

    h.player
        .break_stream(PlaybackError::OutputUnavailable("device unplugged".into()));

    h.wait_for(|s| !s.playing).await;
    let notice = next_notice(&mut notices, |n| matches!(n, SessionNotice::Failed { .. })).await;
    let SessionNotice::Failed { message } = notice else {
        unreachable!();
    };
    assert!(message.contains("device unplugged"));
    assert!(!h.focus.is_held());
}

#[tokio::test]
async fn record_while_playing_tears_playback_down_first() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    let mut snapshots = h.session.subscribe();
    let watcher = tokio::spawn(async move {
        let mut overlapped = false;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            overlapped |= snapshot.recording && snapshot.playing;
        }
        overlapped
    });

    h.session.start_recording().await.unwrap();

    assert_eq!(h.player.stops(), 1);
    assert!(h.player.current_path().is_none());
    let snapshot = h.session.snapshot();
    assert!(snapshot.recording);
    assert!(!snapshot.playing);
    assert!(!h.sensor.is_subscribed());
    assert!(h.focus.is_held());

    let Harness {
        session, worker, ..
    } = h;
    session.shutdown().await.unwrap();
    drop(session);
    worker.await.unwrap();
    assert!(!watcher.await.unwrap());
}

#[tokio::test]
async fn play_while_recording_saves_then_plays_it() {
    let h = Harness::start();
    let started = h.session.start_recording().await.unwrap();

    let playing = h.session.play().await.unwrap();

    assert_eq!(playing, started);
    assert_eq!(h.recorder.stops(), 1);
    assert!(h.recorder.active().is_none());
    assert_eq!(
        h.session.snapshot().mode(),
        SessionMode::Playing(OutputRoute::Speaker)
    );
}

#[tokio::test]
async fn play_continues_when_saving_the_recording_fails() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.session.start_recording().await.unwrap();
    h.recorder
        .fail_next_stop(RecordingError::WriteFailed("disk full".into()));

    let playing = h.session.play().await.unwrap();

    assert!(playing.ends_with("rec_1000.flac"));
    assert!(h.session.snapshot().playing);
}

#[tokio::test]
async fn play_while_playing_restarts_and_ignores_stale_end() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    h.session.play().await.unwrap();
    h.settle().await;

    assert_eq!(h.player.plays().len(), 2);
    assert!(h.session.snapshot().playing);
    assert!(h.focus.is_held());
}

#[tokio::test]
async fn focus_loss_while_recording_saves_and_goes_idle() {
    let h = Harness::start();
    let mut notices = h.session.notices();
    let started = h.session.start_recording().await.unwrap();

    assert!(h.focus.seize_external(FocusGain::Transient, false));
    h.settle().await;

    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
    assert!(h.recorder.active().is_none());
    assert_eq!(h.recorder.stops(), 1);
    assert!(started.exists());
    assert!(!h.focus.is_held());
    next_notice(&mut notices, |n| *n == SessionNotice::Interrupted).await;
}

#[tokio::test]
async fn focus_loss_while_playing_stops_playback() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    assert!(h.focus.seize_external(FocusGain::Permanent, false));
    h.settle().await;

    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
    assert!(h.player.current_path().is_none());
    assert!(!h.sensor.is_subscribed());
}

#[tokio::test]
async fn denied_focus_leaves_mode_unchanged() {
    let h = Harness::start();
    h.focus.seize_external(FocusGain::Permanent, true);

    assert_eq!(
        h.session.start_recording().await,
        Err(SessionError::FocusDenied)
    );
    assert!(h.recorder.starts().is_empty());
    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);

    h.focus.release_external();
    h.session.start_recording().await.unwrap();
    assert!(h.session.snapshot().recording);
}

#[tokio::test]
async fn denied_permission_is_requested_once_then_fails() {
    let gate = DenyingGate::default();
    let h = Harness::build(SessionConfig::default(), gate.clone(), SENSOR_RANGE);

    assert_eq!(
        h.session.start_recording().await,
        Err(SessionError::PermissionDenied)
    );
    assert_eq!(gate.requests(), 1);
    assert!(h.recorder.starts().is_empty());
    assert!(!h.focus.is_held());
}

#[tokio::test]
async fn hardware_failure_on_start_releases_focus() {
    let h = Harness::start();
    h.recorder.fail_next_start(RecordingError::NoAudioDevice);

    let result = h.session.start_recording().await;

    assert!(matches!(result, Err(SessionError::HardwareUnavailable(_))));
    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
    assert!(!h.focus.is_held());
}

#[tokio::test]
async fn failed_play_releases_focus() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.player
        .fail_next_play(PlaybackError::DecodeFailed("not flac".into()));

    let result = h.session.play().await;

    assert!(matches!(result, Err(SessionError::FileIo(_))));
    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
    assert!(!h.focus.is_held());
    assert!(!h.sensor.is_subscribed());
}

#[tokio::test]
async fn recording_stops_at_time_limit() {
    let h = Harness::with_config(SessionConfig {
        max_duration: Duration::from_millis(50),
        ..Default::default()
    });
    let mut notices = h.session.notices();
    let started = h.session.start_recording().await.unwrap();

    next_notice(&mut notices, |n| *n == SessionNotice::LimitReached).await;
    let snapshot = h.wait_for(|s| !s.recording).await;

    assert_eq!(snapshot.recordings[0].path, started);
    assert!(!h.focus.is_held());
}

#[tokio::test]
async fn limit_timer_does_not_outlive_its_recording() {
    let h = Harness::with_config(SessionConfig {
        max_duration: Duration::from_millis(300),
        ..Default::default()
    });

    h.session.start_recording().await.unwrap();
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    h.session.stop_recording().await.unwrap();
    h.session.start_recording().await.unwrap();

    // The first timer would have fired here
    tokio::time::sleep(StdDuration::from_millis(150)).await;
    h.settle().await;
    assert!(h.session.snapshot().recording);
}

#[tokio::test]
async fn toggle_starts_then_saves() {
    let h = Harness::start();

    let Toggled::Started(started) = h.session.toggle_recording().await.unwrap() else {
        panic!("first toggle should start");
    };
    let Toggled::Saved(saved) = h.session.toggle_recording().await.unwrap() else {
        panic!("second toggle should save");
    };

    assert_eq!(started, saved);
    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
}

#[tokio::test]
async fn stop_playback_requires_playback() {
    let h = Harness::start();
    h.seed_recording(1_000);
    assert_eq!(
        h.session.stop_playback().await,
        Err(SessionError::NotPlaying)
    );

    h.session.play().await.unwrap();
    h.session.stop_playback().await.unwrap();

    assert_eq!(h.player.stops(), 1);
    assert_eq!(h.session.snapshot().mode(), SessionMode::Idle);
    assert!(!h.focus.is_held());
}

#[tokio::test]
async fn seek_moves_playback_and_reroute_resumes_there() {
    let h = Harness::start();
    h.seed_recording(1_000);
    assert_eq!(h.session.seek(500).await, Err(SessionError::NotPlaying));

    let mut notices = h.session.notices();
    h.session.play().await.unwrap();
    assert_eq!(h.session.seek(4_000).await, Ok(4_000));

    h.sensor.inject_near();
    let notice = next_notice(&mut notices, |n| matches!(n, SessionNotice::RouteChanged { .. })).await;
    assert_eq!(
        notice,
        SessionNotice::RouteChanged {
            route: OutputRoute::Earpiece,
            position_ms: 4_000
        }
    );
}

#[tokio::test]
async fn shutdown_saves_recording_and_closes() {
    let h = Harness::start();
    let started = h.session.start_recording().await.unwrap();

    h.session.shutdown().await.unwrap();

    assert!(h.recorder.active().is_none());
    assert!(started.exists());
    assert!(!h.focus.is_held());
    assert_eq!(
        h.session.start_recording().await,
        Err(SessionError::ControllerClosed)
    );
}

#[tokio::test]
async fn dropping_every_handle_tears_down() {
    let h = Harness::start();
    h.seed_recording(1_000);
    h.session.play().await.unwrap();

    let Harness {
        session,
        worker,
        player,
        focus,
        sensor,
        dir: _dir,
        ..
    } = h;
    drop(session);
    tokio::time::timeout(WAIT, worker).await.unwrap().unwrap();

    assert!(player.current_path().is_none());
    assert!(!focus.is_held());
    assert!(!sensor.is_subscribed());
}

#[tokio::test]
async fn snapshot_lists_recordings_newest_first() {
    let h = Harness::start();
    let (older, newer) = seed_two(&h).await;

    let recordings = h.session.refresh().await.unwrap();

    let paths: Vec<_> = recordings.iter().map(|r| r.path.clone()).collect();
    assert_eq!(paths, vec![newer, older]);
    assert_eq!(h.session.snapshot().recordings, recordings);
}
