//! In-process audio focus broker
//!
//! Desktop audio servers have no focus protocol, so the broker keeps the
//! single grant itself. External clients (a call, another player) are
//! simulated with `seize_external` and `release_external`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::application::ports::{
    AudioFocusProvider, FocusChange, FocusError, FocusGain, FocusListener, FocusRequest,
    FocusToken,
};

struct Holder {
    token: FocusToken,
    listener: FocusListener,
}

#[derive(Default)]
struct BrokerState {
    holder: Option<Holder>,
    /// An external client holds exclusive focus
    external: bool,
}

/// Single-grant focus broker shared by everything in the process
#[derive(Default)]
pub struct LocalFocusBroker {
    state: Mutex<BrokerState>,
    next_token: AtomicU64,
}

impl LocalFocusBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take focus on behalf of an external client.
    ///
    /// The current holder loses focus. While `exclusive`, new requests are
    /// denied until `release_external`.
    ///
    /// # Returns
    /// true when a local holder was interrupted
    pub fn seize_external(&self, gain: FocusGain, exclusive: bool) -> bool {
        let previous = {
            let mut state = self.lock();
            state.external = exclusive;
            state.holder.take()
        };

        let change = match gain {
            FocusGain::Permanent => FocusChange::Loss,
            FocusGain::Transient => FocusChange::LossTransient,
        };
        tracing::info!(?change, exclusive, "External client took audio focus");

        match previous {
            // Listener runs outside the lock so it may call back into the broker
            Some(holder) => {
                (holder.listener)(change);
                true
            }
            None => false,
        }
    }

    /// End an external client's exclusive hold
    pub fn release_external(&self) {
        let mut state = self.lock();
        if state.external {
            state.external = false;
            tracing::info!("External client released audio focus");
        }
    }

    pub fn is_held(&self) -> bool {
        self.lock().holder.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AudioFocusProvider for LocalFocusBroker {
    fn request(
        &self,
        request: FocusRequest,
        listener: FocusListener,
    ) -> Result<FocusToken, FocusError> {
        let token = FocusToken(self.next_token.fetch_add(1, Ordering::SeqCst) + 1);

        let previous = {
            let mut state = self.lock();
            if state.external {
                return Err(FocusError::Denied(
                    "another client holds exclusive focus".into(),
                ));
            }
            state.holder.replace(Holder { token, listener })
        };

        tracing::debug!(token = token.0, ?request, "Audio focus granted");

        if let Some(previous) = previous {
            let change = match request.gain {
                FocusGain::Permanent => FocusChange::Loss,
                FocusGain::Transient => FocusChange::LossTransient,
            };
            (previous.listener)(change);
        }

        Ok(token)
    }

    fn abandon(&self, token: FocusToken) {
        let mut state = self.lock();
        if state.holder.as_ref().is_some_and(|h| h.token == token) {
            state.holder = None;
            tracing::debug!(token = token.0, "Audio focus abandoned");
        }
    }
}
