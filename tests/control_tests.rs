//! Control socket requests against a live session

mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::Harness;
use voice_memo::application::ports::ThemeSink;
use voice_memo::cli::ipc::{
    CommandRouter, DaemonStatus, IpcClient, IpcServer, SocketPath, UnixSocketClient,
    UnixSocketServer,
};
use voice_memo::domain::session::{OutputRoute, SessionSnapshot};
use voice_memo::domain::theme::Theme;
use voice_memo::infrastructure::SharedThemeSink;

fn router_with_theme(h: &Harness, theme: Arc<SharedThemeSink>) -> CommandRouter {
    CommandRouter::new(
        h.session.clone(),
        Arc::clone(&h.sensor),
        Arc::clone(&h.focus),
        theme,
    )
}

fn router_for(h: &Harness) -> CommandRouter {
    router_with_theme(h, Arc::new(SharedThemeSink::new()))
}

#[tokio::test]
async fn record_and_stop_report_the_file() {
    let h = Harness::start();
    let router = router_for(&h);

    let started = router.dispatch("record").await;
    assert!(started.starts_with("ok recording "), "{started}");
    assert!(started.ends_with(".flac"));

    let saved = router.dispatch("stop").await;
    assert_eq!(
        saved.trim_start_matches("ok saved "),
        started.trim_start_matches("ok recording ")
    );

    assert_eq!(router.dispatch("stop").await, "error: Not recording");
}

#[tokio::test]
async fn status_is_the_snapshot_json() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let router = router_for(&h);
    router.dispatch("play").await;

    let status = router.dispatch("status").await;
    let snapshot: SessionSnapshot = serde_json::from_str(&status).unwrap();

    assert!(snapshot.playing);
    assert!(!snapshot.recording);
    assert_eq!(snapshot.route, Some(OutputRoute::Speaker));
    assert_eq!(snapshot.recordings.len(), 1);
}

#[tokio::test]
async fn status_reports_the_scheduled_theme() {
    let h = Harness::start();
    let theme = Arc::new(SharedThemeSink::new());
    let router = router_with_theme(&h, Arc::clone(&theme));

    let status: DaemonStatus = serde_json::from_str(&router.dispatch("status").await).unwrap();
    assert_eq!(status.theme, None);

    theme.apply(Theme::Dark);
    let line = router.dispatch("status").await;
    assert!(line.contains(r#""theme":"dark""#), "{line}");
    let status: DaemonStatus = serde_json::from_str(&line).unwrap();
    assert_eq!(status.theme, Some(Theme::Dark));
    assert!(!status.session.playing);
}

#[tokio::test]
async fn seek_reports_the_new_position() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let router = router_for(&h);

    assert_eq!(router.dispatch("seek 2000").await, "error: Not playing");

    router.dispatch("play").await;
    assert_eq!(router.dispatch("seek 2000").await, "ok position 2000");
}

#[tokio::test]
async fn proximity_commands_reach_the_sensor_only_while_playing() {
    let h = Harness::start();
    h.seed_recording(1_000);
    let router = router_for(&h);

    assert_eq!(router.dispatch("near").await, "ok ignored");

    router.dispatch("play").await;
    assert_eq!(router.dispatch("proximity 0.5").await, "ok delivered");
    h.wait_for(|s| s.route == Some(OutputRoute::Earpiece)).await;

    assert_eq!(router.dispatch("far").await, "ok delivered");
    h.wait_for(|s| s.route == Some(OutputRoute::Speaker)).await;
}

#[tokio::test]
async fn interrupt_blocks_until_resume() {
    let h = Harness::start();
    let router = router_for(&h);
    router.dispatch("record").await;

    assert_eq!(router.dispatch("interrupt").await, "ok interrupted");
    h.wait_for(|s| !s.recording).await;
    assert_eq!(
        router.dispatch("record").await,
        "error: Audio focus denied by another application"
    );

    assert_eq!(router.dispatch("resume").await, "ok resumed");
    assert!(router.dispatch("record").await.starts_with("ok recording "));
}

#[tokio::test]
async fn unknown_command_is_an_error_line() {
    let h = Harness::start();
    let router = router_for(&h);

    assert_eq!(
        router.dispatch("rewind").await,
        "error: unknown command 'rewind'"
    );
    assert!(h.recorder.starts().is_empty());
}

#[tokio::test]
async fn socket_round_trip() {
    let h = Harness::start();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("control.sock");

    let mut server = UnixSocketServer::new(SocketPath::with_path(&path));
    server.bind().unwrap();
    let router = Arc::new(router_for(&h));
    let server_task = tokio::spawn(async move {
        let _ = server.run(router).await;
    });

    let client = UnixSocketClient::new(SocketPath::with_path(&path));
    assert!(client.is_daemon_running());

    let response = client.send_command("toggle").await.unwrap();
    assert!(response.starts_with("ok recording "), "{response}");
    assert!(response.ends_with('\n'));
    assert!(h.session.snapshot().recording);

    let response = client.send_command("toggle").await.unwrap();
    assert!(response.starts_with("ok saved "), "{response}");

    server_task.abort();
}
