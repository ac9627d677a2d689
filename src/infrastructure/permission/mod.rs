//! Recording capability checks

mod device_gate;

pub use device_gate::{AlwaysGranted, DevicePermissionGate};
