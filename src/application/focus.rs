//! Audio focus arbitration
//!
//! Wraps an [`AudioFocusProvider`] so the session holds at most one focus
//! grant at a time and hears about involuntary losses through a single
//! interrupt callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::ports::{AudioFocusProvider, FocusChange, FocusListener, FocusRequest, FocusToken};

/// Callback invoked when a held grant is lost involuntarily
pub type InterruptCallback = Arc<dyn Fn(FocusChange) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct Registration {
    id: u64,
    token: Option<FocusToken>,
}

/// Holds at most one focus grant on behalf of the session
pub struct AudioFocusArbiter<F: AudioFocusProvider> {
    provider: F,
    request: FocusRequest,
    current: Arc<Mutex<Option<Registration>>>,
    next_id: AtomicU64,
}

impl<F: AudioFocusProvider> AudioFocusArbiter<F> {
    /// Create an arbiter requesting transient exclusive media focus
    pub fn new(provider: F) -> Self {
        Self {
            provider,
            request: FocusRequest::transient_exclusive(),
            current: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Request focus, replacing any grant this arbiter already holds.
    ///
    /// `on_interrupt` runs on the provider's thread when this grant is lost.
    /// It is never called for a grant that was since released or replaced.
    ///
    /// # Returns
    /// true when focus was granted
    pub fn acquire(&self, on_interrupt: InterruptCallback) -> bool {
        self.release();

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        // Registered before the request so a loss racing the grant is still delivered.
        *lock(&self.current) = Some(Registration { id, token: None });

        let current = Arc::clone(&self.current);
        let listener: FocusListener = Arc::new(move |change: FocusChange| {
            if !change.is_loss() {
                return;
            }
            let still_current = lock(&current).map(|r| r.id) == Some(id);
            if still_current {
                on_interrupt(change);
            }
        });

        match self.provider.request(self.request, listener) {
            Ok(token) => {
                let mut guard = lock(&self.current);
                match guard.as_mut() {
                    Some(registration) if registration.id == id => {
                        registration.token = Some(token);
                    }
                    _ => {
                        // Released while the request was in flight
                        drop(guard);
                        self.provider.abandon(token);
                        return false;
                    }
                }
                tracing::debug!(grant = id, "Audio focus granted");
                true
            }
            Err(e) => {
                let mut guard = lock(&self.current);
                if guard.map(|r| r.id) == Some(id) {
                    *guard = None;
                }
                tracing::warn!(error = %e, "Audio focus denied");
                false
            }
        }
    }

    /// Give focus back. Safe to call when nothing is held.
    pub fn release(&self) {
        let taken = lock(&self.current).take();
        if let Some(Registration {
            id,
            token: Some(token),
        }) = taken
        {
            self.provider.abandon(token);
            tracing::debug!(grant = id, "Audio focus released");
        }
    }

    /// Check whether a grant is currently held
    pub fn is_held(&self) -> bool {
        lock(&self.current).is_some_and(|r| r.token.is_some())
    }
}

impl<F: AudioFocusProvider> Drop for AudioFocusArbiter<F> {
    fn drop(&mut self) {
        self.release();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
