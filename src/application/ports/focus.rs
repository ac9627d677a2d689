//! Audio focus provider port
//!
//! Models the OS audio-focus service: one holder at a time, and the previous
//! holder is told when someone else takes focus.

use std::sync::Arc;

use thiserror::Error;

/// Focus change delivered to a holder's listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gain,
    /// Permanent loss: another client took focus with no intent to return it
    Loss,
    /// Temporary loss: another client holds transient focus
    LossTransient,
}

impl FocusChange {
    pub const fn is_loss(&self) -> bool {
        matches!(self, Self::Loss | Self::LossTransient)
    }
}

/// Duration class of a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusGain {
    Permanent,
    Transient,
}

/// What the focused stream is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioUsage {
    Media,
}

/// Parameters of a focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRequest {
    pub gain: FocusGain,
    pub usage: AudioUsage,
    /// Peers must pause rather than lower their volume
    pub pause_when_ducked: bool,
}

impl FocusRequest {
    /// Transient media focus that pauses other clients
    pub const fn transient_exclusive() -> Self {
        Self {
            gain: FocusGain::Transient,
            usage: AudioUsage::Media,
            pause_when_ducked: true,
        }
    }
}

/// Opaque grant identifier handed out by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusToken(pub u64);

/// Callback invoked by the provider when the holder's focus changes
pub type FocusListener = Arc<dyn Fn(FocusChange) + Send + Sync>;

/// Focus errors
#[derive(Debug, Clone, Error)]
pub enum FocusError {
    #[error("Audio focus request denied: {0}")]
    Denied(String),
}

/// Port for the audio focus service
pub trait AudioFocusProvider: Send + Sync {
    /// Request focus. Any current holder is notified of its loss.
    fn request(
        &self,
        request: FocusRequest,
        listener: FocusListener,
    ) -> Result<FocusToken, FocusError>;

    /// Give focus back. Unknown or stale tokens are ignored.
    fn abandon(&self, token: FocusToken);
}

impl<T: AudioFocusProvider + ?Sized> AudioFocusProvider for Arc<T> {
    fn request(
        &self,
        request: FocusRequest,
        listener: FocusListener,
    ) -> Result<FocusToken, FocusError> {
        self.as_ref().request(request, listener)
    }

    fn abandon(&self, token: FocusToken) {
        self.as_ref().abandon(token)
    }
}
