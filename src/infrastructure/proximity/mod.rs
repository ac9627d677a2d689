//! Proximity sensor adapters

mod virtual_sensor;

pub use virtual_sensor::VirtualProximitySensor;
