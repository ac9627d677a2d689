//! Microphone and storage capability check
//!
//! Desktop systems grant microphone access to any process, so "permission"
//! means an input device exists and the recordings directory is usable.
//! Requesting creates the directory.

use std::path::PathBuf;

use async_trait::async_trait;
use cpal::traits::HostTrait;

use crate::application::ports::PermissionGate;

pub struct DevicePermissionGate {
    recordings_dir: PathBuf,
}

impl DevicePermissionGate {
    pub fn new(recordings_dir: impl Into<PathBuf>) -> Self {
        Self {
            recordings_dir: recordings_dir.into(),
        }
    }

    fn has_input_device() -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn directory_usable(&self) -> bool {
        std::fs::metadata(&self.recordings_dir)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false)
    }
}

#[async_trait]
impl PermissionGate for DevicePermissionGate {
    fn is_granted(&self) -> bool {
        self.directory_usable() && Self::has_input_device()
    }

    async fn request(&self) -> bool {
        if let Err(e) = tokio::fs::create_dir_all(&self.recordings_dir).await {
            tracing::error!(
                dir = %self.recordings_dir.display(),
                error = %e,
                "Cannot create recordings directory"
            );
            return false;
        }

        let has_device = tokio::task::spawn_blocking(Self::has_input_device)
            .await
            .unwrap_or(false);
        if !has_device {
            tracing::error!("No audio input device available");
        }
        has_device && self.directory_usable()
    }
}

/// Gate that never refuses, for setups without capability checks
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

#[async_trait]
impl PermissionGate for AlwaysGranted {
    fn is_granted(&self) -> bool {
        true
    }

    async fn request(&self) -> bool {
        true
    }
}
