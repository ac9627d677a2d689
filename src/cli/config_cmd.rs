//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, OutputConfig, ProximityConfig};
use crate::domain::error::ConfigError;
use crate::domain::proximity::ThresholdMode;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    presenter.output(read_value(&config, key).as_deref().unwrap_or(NOT_SET));

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        presenter.key_value(key, read_value(&config, key).as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "recordings_dir" => {
            if value.trim().is_empty() {
                return Err(invalid("Value must not be empty".to_string()));
            }
            config.recordings_dir = Some(value.to_string());
        }
        "max_duration" => {
            let duration: Duration = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            config.max_duration = Some(duration.to_string());
        }
        "notify" => {
            config.notify = Some(parse_bool(value).map_err(|_| invalid(bool_message()))?);
        }
        "auto_theme" => {
            config.auto_theme = Some(parse_bool(value).map_err(|_| invalid(bool_message()))?);
        }
        "proximity.threshold" => {
            let mode: ThresholdMode = value.parse().map_err(|e| invalid(format!("{}", e)))?;
            proximity_section(config).threshold = Some(mode.to_string());
        }
        "proximity.max_range" => {
            let range: f32 = value
                .parse()
                .ok()
                .filter(|r: &f32| r.is_finite() && *r >= 0.0)
                .ok_or_else(|| invalid("Value must be a non-negative number (0 disables the sensor)".to_string()))?;
            proximity_section(config).max_range = Some(range);
        }
        "output.speaker_device" => {
            output_section(config).speaker_device = Some(value.to_string());
        }
        "output.earpiece_device" => {
            output_section(config).earpiece_device = Some(value.to_string());
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    let proximity = config.proximity.as_ref();
    let output = config.output.as_ref();
    match key {
        "recordings_dir" => config.recordings_dir.clone(),
        "max_duration" => config.max_duration.clone(),
        "notify" => config.notify.map(|b| b.to_string()),
        "auto_theme" => config.auto_theme.map(|b| b.to_string()),
        "proximity.threshold" => proximity.and_then(|p| p.threshold.clone()),
        "proximity.max_range" => proximity.and_then(|p| p.max_range).map(|r| r.to_string()),
        "output.speaker_device" => output.and_then(|o| o.speaker_device.clone()),
        "output.earpiece_device" => output.and_then(|o| o.earpiece_device.clone()),
        _ => None,
    }
}

fn proximity_section(config: &mut AppConfig) -> &mut ProximityConfig {
    config.proximity.get_or_insert_with(ProximityConfig::default)
}

fn output_section(config: &mut AppConfig) -> &mut OutputConfig {
    config.output.get_or_insert_with(OutputConfig::default)
}

fn bool_message() -> String {
    "Value must be 'true' or 'false'".to_string()
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
