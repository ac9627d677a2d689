//! Near/far classification of raw proximity distances

use std::fmt;
use std::str::FromStr;

use crate::domain::error::ThresholdModeError;

/// Tagged proximity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Proximity {
    Near,
    Far,
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Near => write!(f, "near"),
            Self::Far => write!(f, "far"),
        }
    }
}

/// Which fraction of the sensor's maximum range counts as "near"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdMode {
    /// Near when the distance is below the full maximum range
    #[default]
    FullRange,
    /// Near when the distance is below half the maximum range
    HalfRange,
}

impl ThresholdMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FullRange => "full",
            Self::HalfRange => "half",
        }
    }

    /// Threshold distance for a sensor with the given maximum range
    pub fn threshold(&self, max_range: f32) -> f32 {
        match self {
            Self::FullRange => max_range,
            Self::HalfRange => max_range / 2.0,
        }
    }
}

impl fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ThresholdMode {
    type Err = ThresholdModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::FullRange),
            "half" => Ok(Self::HalfRange),
            _ => Err(ThresholdModeError {
                input: s.to_string(),
            }),
        }
    }
}

/// Classifies readings and reports only transitions.
///
/// Starts out Far, so a leading far reading is not reported.
#[derive(Debug, Clone)]
pub struct ProximityClassifier {
    threshold: f32,
    last: Proximity,
}

impl ProximityClassifier {
    pub fn new(max_range: f32, mode: ThresholdMode) -> Self {
        Self {
            threshold: mode.threshold(max_range),
            last: Proximity::Far,
        }
    }

    /// Classify a raw distance without updating state
    pub fn classify(&self, distance: f32) -> Proximity {
        if distance < self.threshold {
            Proximity::Near
        } else {
            Proximity::Far
        }
    }

    /// Feed a reading; returns the new classification only on a transition
    pub fn observe(&mut self, distance: f32) -> Option<Proximity> {
        if distance.is_nan() {
            return None;
        }
        let current = self.classify(distance);
        if current == self.last {
            return None;
        }
        self.last = current;
        Some(current)
    }

    pub fn last(&self) -> Proximity {
        self.last
    }
}
