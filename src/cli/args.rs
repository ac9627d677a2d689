//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::config::{AppConfig, ProximityConfig};
use crate::domain::proximity::ThresholdMode;

/// Voice Memo - record and play back voice memos
#[derive(Parser, Debug)]
#[command(name = "voice-memo")]
#[command(version)]
#[command(about = "Voice memo recorder with proximity-aware playback routing")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the session daemon
    Serve(ServeOptions),
    /// Send a command to the running daemon
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
    /// List recordings, newest first
    List {
        /// Directory to list (defaults to the configured one)
        #[arg(long, value_name = "DIR")]
        recordings_dir: Option<PathBuf>,
    },
    /// Show the current theme and the next switch time
    Theme,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `serve`. Unset flags fall back to the config file.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ServeOptions {
    /// Directory recordings are written to
    #[arg(long, value_name = "DIR")]
    pub recordings_dir: Option<PathBuf>,

    /// Recording time limit (e.g., 90s, 5m, 1h)
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Show desktop notifications
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Distance below which the listener counts as near
    #[arg(long, value_name = "MODE")]
    pub proximity_threshold: Option<ThresholdArg>,

    /// Do not switch between light and dark theme
    #[arg(long)]
    pub no_auto_theme: bool,
}

impl ServeOptions {
    /// Config layer made of the flags that were given
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            recordings_dir: self
                .recordings_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
            max_duration: self.max_duration.clone(),
            notify: self.notify.then_some(true),
            auto_theme: self.no_auto_theme.then_some(false),
            proximity: self.proximity_threshold.map(|arg| ProximityConfig {
                threshold: Some(ThresholdMode::from(arg).to_string()),
                max_range: None,
            }),
            output: None,
        }
    }
}

/// Daemon control actions
#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum DaemonAction {
    /// Start recording
    Record,
    /// Stop recording and save the file
    Stop,
    /// Stop if recording, otherwise start
    Toggle,
    /// Play the most recent recording
    Play,
    /// Stop playback
    StopPlayback,
    /// Jump within the current playback
    Seek {
        /// Position in milliseconds
        position_ms: u64,
    },
    /// Report the listener as near the device
    Near,
    /// Report the listener as away from the device
    Far,
    /// Report a raw sensor distance
    Proximity {
        /// Distance in centimeters
        distance: f32,
    },
    /// Simulate another app taking exclusive audio focus
    Interrupt,
    /// End a simulated interruption
    Resume,
    /// Show daemon status
    Status,
}

impl DaemonAction {
    /// Wire form sent over the control socket
    pub fn to_command(&self) -> String {
        match self {
            Self::Record => "record".to_string(),
            Self::Stop => "stop".to_string(),
            Self::Toggle => "toggle".to_string(),
            Self::Play => "play".to_string(),
            Self::StopPlayback => "stop-playback".to_string(),
            Self::Seek { position_ms } => format!("seek {}", position_ms),
            Self::Near => "near".to_string(),
            Self::Far => "far".to_string(),
            Self::Proximity { distance } => format!("proximity {}", distance),
            Self::Interrupt => "interrupt".to_string(),
            Self::Resume => "resume".to_string(),
            Self::Status => "status".to_string(),
        }
    }
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Threshold argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThresholdArg {
    Full,
    Half,
}

impl From<ThresholdArg> for ThresholdMode {
    fn from(arg: ThresholdArg) -> Self {
        match arg {
            ThresholdArg::Full => ThresholdMode::FullRange,
            ThresholdArg::Half => ThresholdMode::HalfRange,
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "recordings_dir",
    "max_duration",
    "notify",
    "auto_theme",
    "proximity.threshold",
    "proximity.max_range",
    "output.speaker_device",
    "output.earpiece_device",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn serve_parses_defaults() {
        let cli = Cli::parse_from(["voice-memo", "serve"]);
        let Commands::Serve(options) = cli.command else {
            panic!("Expected Serve command");
        };
        assert!(options.recordings_dir.is_none());
        assert!(options.max_duration.is_none());
        assert!(!options.notify);
        assert!(options.proximity_threshold.is_none());
        assert!(!options.no_auto_theme);
        assert_eq!(options.to_config(), AppConfig::empty());
    }

    #[test]
    fn serve_flags_become_config_layer() {
        let cli = Cli::parse_from([
            "voice-memo",
            "serve",
            "--recordings-dir",
            "/tmp/memos",
            "--max-duration",
            "5m",
            "-n",
            "--proximity-threshold",
            "half",
            "--no-auto-theme",
        ]);
        let Commands::Serve(options) = cli.command else {
            panic!("Expected Serve command");
        };

        let config = options.to_config();
        assert_eq!(config.recordings_dir, Some("/tmp/memos".to_string()));
        assert_eq!(config.max_duration, Some("5m".to_string()));
        assert_eq!(config.notify, Some(true));
        assert_eq!(config.auto_theme, Some(false));
        assert_eq!(config.threshold_or_default(), ThresholdMode::HalfRange);
    }

    #[test]
    fn daemon_actions_map_to_wire_commands() {
        let cases = [
            (vec!["record"], "record"),
            (vec!["stop-playback"], "stop-playback"),
            (vec!["seek", "90000"], "seek 90000"),
            (vec!["proximity", "2.5"], "proximity 2.5"),
            (vec!["interrupt"], "interrupt"),
            (vec!["status"], "status"),
        ];
        for (args, expected) in cases {
            let argv = ["voice-memo", "daemon"].into_iter().chain(args);
            let cli = Cli::parse_from(argv);
            let Commands::Daemon { action } = cli.command else {
                panic!("Expected Daemon command");
            };
            assert_eq!(action.to_command(), expected);
        }
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::parse_from(["voice-memo", "config", "set", "proximity.threshold", "half"]);
        if let Commands::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "proximity.threshold");
            assert_eq!(value, "half");
        } else {
            panic!("Expected Config Set command");
        }
    }

    #[test]
    fn valid_config_keys() {
        assert!(is_valid_config_key("recordings_dir"));
        assert!(is_valid_config_key("proximity.max_range"));
        assert!(is_valid_config_key("output.earpiece_device"));
        assert!(!is_valid_config_key("api_key"));
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
