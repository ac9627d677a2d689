//! Proximity domain module

mod classifier;

pub use classifier::{Proximity, ProximityClassifier, ThresholdMode};
