//! Software proximity sensor
//!
//! Readings are injected (from IPC commands or tests) instead of coming
//! from hardware. Injection honours the subscribed sampling rate: a reading
//! that arrives too soon after the last delivered one is held, and the
//! latest held reading is delivered once the interval has elapsed.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use crate::application::ports::{
    ProximityReading, ProximitySensor, ReadingListener, SamplingRate, SensorError,
};

struct Subscription {
    id: u64,
    listener: ReadingListener,
    rate: SamplingRate,
    last_delivery: Option<Instant>,
    pending: Option<f32>,
}

#[derive(Default)]
struct SensorState {
    subscription: Option<Subscription>,
    next_id: u64,
}

type SharedState = Arc<Mutex<SensorState>>;

pub struct VirtualProximitySensor {
    max_range: f32,
    throttle: bool,
    state: SharedState,
}

impl VirtualProximitySensor {
    /// Create a sensor reporting `max_range`. A range of zero or less
    /// behaves like a device without a sensor.
    pub fn new(max_range: f32) -> Self {
        Self {
            max_range,
            throttle: true,
            state: SharedState::default(),
        }
    }

    /// Deliver every injected reading immediately regardless of sampling rate
    pub fn unthrottled(max_range: f32) -> Self {
        Self {
            throttle: false,
            ..Self::new(max_range)
        }
    }

    /// Feed a distance reading.
    ///
    /// # Returns
    /// true when a subscriber received it or will receive it at the next
    /// sampling interval
    pub fn inject(&self, distance: f32) -> bool {
        let listener = {
            let mut guard = lock(&self.state);
            let Some(subscription) = guard.subscription.as_mut() else {
                return false;
            };

            // A held reading is flushed first so order is preserved
            if subscription.pending.is_some() {
                subscription.pending = Some(distance);
                return true;
            }

            let now = Instant::now();
            let wait = subscription
                .last_delivery
                .map(|last| subscription.rate.interval().saturating_sub(now.duration_since(last)))
                .filter(|wait| self.throttle && !wait.is_zero());
            if let Some(wait) = wait {
                tracing::debug!(distance, wait_ms = wait.as_millis() as u64, "Holding proximity reading");
                subscription.pending = Some(distance);
                schedule_flush(Arc::downgrade(&self.state), subscription.id, wait);
                return true;
            }

            subscription.last_delivery = Some(now);
            subscription.listener.clone()
        };

        listener(ProximityReading { distance });
        true
    }

    /// Reading that classifies as near
    pub fn inject_near(&self) -> bool {
        self.inject(0.0)
    }

    /// Reading that classifies as far
    pub fn inject_far(&self) -> bool {
        self.inject(self.max_range.max(0.0))
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.state).subscription.is_some()
    }
}

fn lock(state: &Mutex<SensorState>) -> MutexGuard<'_, SensorState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

fn schedule_flush(state: Weak<Mutex<SensorState>>, id: u64, wait: Duration) {
    let spawned = std::thread::Builder::new()
        .name("proximity-sampler".into())
        .spawn(move || {
            std::thread::sleep(wait);
            if let Some(state) = state.upgrade() {
                flush(&state, id);
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "Failed to schedule held proximity reading");
    }
}

/// Deliver the held reading if `id` is still the active subscription
fn flush(state: &Mutex<SensorState>, id: u64) {
    let (listener, distance) = {
        let mut guard = lock(state);
        let Some(subscription) = guard.subscription.as_mut().filter(|s| s.id == id) else {
            return;
        };
        let Some(distance) = subscription.pending.take() else {
            return;
        };
        subscription.last_delivery = Some(Instant::now());
        (subscription.listener.clone(), distance)
    };

    listener(ProximityReading { distance });
}

impl ProximitySensor for VirtualProximitySensor {
    fn max_range(&self) -> Option<f32> {
        (self.max_range > 0.0).then_some(self.max_range)
    }

    fn subscribe(&self, rate: SamplingRate, listener: ReadingListener) -> Result<(), SensorError> {
        if self.max_range <= 0.0 {
            return Err(SensorError::SubscribeFailed("sensor disabled".into()));
        }
        let mut guard = lock(&self.state);
        guard.next_id += 1;
        guard.subscription = Some(Subscription {
            id: guard.next_id,
            listener,
            rate,
            last_delivery: None,
            pending: None,
        });
        Ok(())
    }

    fn unsubscribe(&self) {
        lock(&self.state).subscription.take();
    }
}
