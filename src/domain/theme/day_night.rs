//! Time-of-day theme windows
//!
//! Day (light) runs 06:00–17:59 local time, night (dark) 18:00–05:59.

use std::fmt;

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

/// First hour of the day window
pub const DAY_START_HOUR: i8 = 6;

/// First hour of the night window
pub const NIGHT_START_HOUR: i8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Theme for a local hour of day (0-23)
    pub fn for_hour(hour: i8) -> Self {
        if is_night_hour(hour) {
            Self::Dark
        } else {
            Self::Light
        }
    }

    pub fn for_time(now: DateTime) -> Self {
        Self::for_hour(now.hour())
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// True for hours in the night window
pub fn is_night_hour(hour: i8) -> bool {
    !(DAY_START_HOUR..NIGHT_START_HOUR).contains(&hour)
}

/// The next 06:00 or 18:00 strictly after `now`
pub fn next_switch_after(now: DateTime) -> Result<DateTime, jiff::Error> {
    let date = now.date();
    let hour = now.hour();

    if hour < DAY_START_HOUR {
        Ok(date.at(DAY_START_HOUR, 0, 0, 0))
    } else if hour < NIGHT_START_HOUR {
        Ok(date.at(NIGHT_START_HOUR, 0, 0, 0))
    } else {
        Ok(date.tomorrow()?.at(DAY_START_HOUR, 0, 0, 0))
    }
}
