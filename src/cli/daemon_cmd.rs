//! Daemon command handler - sends commands to running daemon via IPC

use super::args::DaemonAction;
use super::ipc::{create_ipc_client, DaemonStatus, IpcClient};
use super::presenter::Presenter;

/// Handle daemon subcommand
pub async fn handle_daemon_command(
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    send_action(create_ipc_client().as_ref(), action, presenter).await
}

async fn send_action(
    client: &dyn IpcClient,
    action: DaemonAction,
    presenter: &Presenter,
) -> Result<(), String> {
    if !client.is_daemon_running() {
        return Err("No daemon running. Start with: voice-memo serve".to_string());
    }

    let response = client
        .send_command(&action.to_command())
        .await
        .map_err(|e| format!("Failed to communicate with daemon: {}", e))?;

    let reply = interpret_response(action, response.trim())?;
    match reply {
        Reply::Status(status) => presenter.status(&status),
        Reply::Done(message) => presenter.success(&message),
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Reply {
    Status(DaemonStatus),
    Done(String),
}

fn interpret_response(action: DaemonAction, response: &str) -> Result<Reply, String> {
    if let Some(message) = response.strip_prefix("error:") {
        return Err(message.trim().to_string());
    }

    if action == DaemonAction::Status {
        return serde_json::from_str(response)
            .map(Reply::Status)
            .map_err(|e| format!("Unreadable status from daemon: {}", e));
    }

    match response.strip_prefix("ok") {
        Some(message) => Ok(Reply::Done(message.trim().to_string())),
        None => Err(format!("Unexpected response from daemon: {}", response)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_line_becomes_err() {
        let result = interpret_response(DaemonAction::Stop, "error: Not recording");
        assert_eq!(result, Err("Not recording".to_string()));
    }

    #[test]
    fn ok_line_keeps_message() {
        let result = interpret_response(DaemonAction::Play, "ok playing /tmp/rec_1.flac");
        assert_eq!(result, Ok(Reply::Done("playing /tmp/rec_1.flac".to_string())));
    }

    use crate::domain::theme::Theme;

    #[test]
    fn status_line_is_decoded() {
        let status = DaemonStatus {
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        let json = serde_json::to_string(&status).unwrap();
        let result = interpret_response(DaemonAction::Status, &json);
        assert_eq!(result, Ok(Reply::Status(status)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(interpret_response(DaemonAction::Status, "idle").is_err());
        assert!(interpret_response(DaemonAction::Record, "maybe").is_err());
    }
}
