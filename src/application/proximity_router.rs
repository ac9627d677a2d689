//! Proximity-driven route requests
//!
//! Turns raw sensor readings into near/far transitions. The router only
//! asks for route changes; the session owns the playback pipeline.

use std::sync::{Arc, Mutex};

use super::ports::{ProximityReading, ProximitySensor, ReadingListener, SamplingRate};
use crate::domain::proximity::{Proximity, ProximityClassifier, ThresholdMode};

/// Callback invoked on a near/far transition
pub type TransitionCallback = Arc<dyn Fn(Proximity) + Send + Sync>;

pub struct ProximityRouter<S: ProximitySensor> {
    sensor: S,
    mode: ThresholdMode,
    registered: Mutex<bool>,
}

impl<S: ProximitySensor> ProximityRouter<S> {
    pub fn new(sensor: S, mode: ThresholdMode) -> Self {
        Self {
            sensor,
            mode,
            registered: Mutex::new(false),
        }
    }

    /// Attach to the sensor and report transitions to `on_transition`.
    ///
    /// Each registration starts from `Far`. While registered, further calls
    /// keep the existing callback. Without a sensor this does nothing.
    ///
    /// # Returns
    /// true when the sensor is attached
    pub fn register(&self, on_transition: TransitionCallback) -> bool {
        let mut registered = lock(&self.registered);
        if *registered {
            tracing::debug!("Proximity sensor already registered");
            return true;
        }

        let Some(max_range) = self.sensor.max_range().filter(|range| *range > 0.0) else {
            tracing::debug!("No proximity sensor, routing stays on speaker");
            return false;
        };

        let classifier = Mutex::new(ProximityClassifier::new(max_range, self.mode));
        let listener: ReadingListener = Arc::new(move |reading: ProximityReading| {
            let transition = lock(&classifier).observe(reading.distance);
            if let Some(proximity) = transition {
                on_transition(proximity);
            }
        });

        match self.sensor.subscribe(SamplingRate::Normal, listener) {
            Ok(()) => {
                *registered = true;
                tracing::debug!(max_range, mode = %self.mode, "Proximity sensor registered");
                true
            }
            Err(e) => {
                *registered = false;
                tracing::warn!(error = %e, "Proximity sensor unavailable");
                false
            }
        }
    }

    /// Detach from the sensor. Safe to call when not registered.
    pub fn unregister(&self) {
        let mut registered = lock(&self.registered);
        if *registered {
            self.sensor.unsubscribe();
            *registered = false;
            tracing::debug!("Proximity sensor unregistered");
        }
    }
}

impl<S: ProximitySensor> Drop for ProximityRouter<S> {
    fn drop(&mut self) {
        self.unregister();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
