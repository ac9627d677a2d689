//! Runners for the commands that do not need a daemon

use std::path::PathBuf;
use std::process::ExitCode;

use crate::application::ports::{ConfigStore, RecordingLibrary};
use crate::application::theme::next_switch_now;
use crate::application::ThemeScheduler;
use crate::domain::config::AppConfig;
use crate::infrastructure::{FsRecordingLibrary, SharedThemeSink, XdgConfigStore};

use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Print the recordings directory, newest first
pub async fn run_list(recordings_dir: Option<PathBuf>) -> ExitCode {
    let presenter = Presenter::new();
    let overrides = AppConfig {
        recordings_dir: recordings_dir.map(|dir| dir.to_string_lossy().into_owned()),
        ..Default::default()
    };
    let config = XdgConfigStore::new().load_merged(overrides).await;
    let library = FsRecordingLibrary::new(config.recordings_dir_or_default());

    match library.list().await {
        Ok(recordings) => {
            presenter.recordings(&recordings);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Print the theme for the local time and when it next changes
pub fn run_theme() -> ExitCode {
    let presenter = Presenter::new();
    let scheduler = ThemeScheduler::new(SharedThemeSink::new());
    presenter.key_value("theme", scheduler.apply_now().as_str());
    let window = if scheduler.is_night_window() {
        "night (18:00-05:59)"
    } else {
        "day (06:00-17:59)"
    };
    presenter.key_value("window", window);

    match next_switch_now() {
        Ok(next) => {
            presenter.key_value("next switch", &next.strftime("%Y-%m-%d %H:%M %Z").to_string());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Failed to compute next theme switch: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
