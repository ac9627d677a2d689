//! Configuration domain module

mod app_config;

pub use app_config::{AppConfig, OutputConfig, ProximityConfig, DEFAULT_SENSOR_MAX_RANGE};
