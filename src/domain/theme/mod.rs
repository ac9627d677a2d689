//! Theme domain module

mod day_night;

pub use day_night::{is_night_hour, next_switch_after, Theme, DAY_START_HOUR, NIGHT_START_HOUR};
