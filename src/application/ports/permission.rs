//! Capability check port

use async_trait::async_trait;

/// Port for the microphone and storage capability check
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Check whether recording is currently allowed
    fn is_granted(&self) -> bool;

    /// Ask for the capability and wait for the answer.
    ///
    /// # Returns
    /// true when the capability is granted afterwards
    async fn request(&self) -> bool;
}
