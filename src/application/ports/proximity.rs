//! Proximity sensor port

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Sensor errors
#[derive(Debug, Clone, Error)]
pub enum SensorError {
    #[error("Failed to subscribe to proximity sensor: {0}")]
    SubscribeFailed(String),
}

/// Requested delivery rate for readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingRate {
    /// Coarse rate suitable for screen-off style gestures
    #[default]
    Normal,
    Fast,
}

impl SamplingRate {
    /// Minimum spacing between readings the sensor should deliver
    pub const fn interval(&self) -> Duration {
        match self {
            Self::Normal => Duration::from_millis(200),
            Self::Fast => Duration::from_millis(20),
        }
    }
}

/// Raw sensor sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityReading {
    /// Distance to the nearest object, in the sensor's units
    pub distance: f32,
}

/// Callback receiving raw readings
pub type ReadingListener = Arc<dyn Fn(ProximityReading) + Send + Sync>;

/// Port for a proximity sensor
pub trait ProximitySensor: Send + Sync {
    /// Maximum range reported by the sensor; None when the device has no sensor
    fn max_range(&self) -> Option<f32>;

    /// Start delivering readings to `listener`, replacing any previous listener
    fn subscribe(&self, rate: SamplingRate, listener: ReadingListener) -> Result<(), SensorError>;

    /// Stop delivering readings. Safe to call when not subscribed.
    fn unsubscribe(&self);
}

impl<T: ProximitySensor + ?Sized> ProximitySensor for Arc<T> {
    fn max_range(&self) -> Option<f32> {
        self.as_ref().max_range()
    }

    fn subscribe(&self, rate: SamplingRate, listener: ReadingListener) -> Result<(), SensorError> {
        self.as_ref().subscribe(rate, listener)
    }

    fn unsubscribe(&self) {
        self.as_ref().unsubscribe()
    }
}
