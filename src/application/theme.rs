//! Day/night theme scheduling

use std::sync::Arc;
use std::time::Duration as StdDuration;

use jiff::civil::DateTime;
use jiff::Zoned;
use tokio::task::JoinHandle;

use super::ports::ThemeSink;
use crate::domain::theme::{is_night_hour, next_switch_after, Theme};

/// Applies the theme for the local time and re-applies it at each boundary
pub struct ThemeScheduler<T: ThemeSink> {
    sink: T,
}

impl<T: ThemeSink + 'static> ThemeScheduler<T> {
    pub fn new(sink: T) -> Self {
        Self { sink }
    }

    /// Apply the theme for the current local time
    pub fn apply_now(&self) -> Theme {
        self.apply_at(Zoned::now().datetime())
    }

    /// Apply the theme for `now`. Re-applying the current theme is a no-op.
    pub fn apply_at(&self, now: DateTime) -> Theme {
        let theme = Theme::for_time(now);
        if self.sink.current() != Some(theme) {
            self.sink.apply(theme);
            tracing::info!(%theme, "Theme applied");
        }
        theme
    }

    /// Check whether local time is in the night window
    pub fn is_night_window(&self) -> bool {
        is_night_hour(Zoned::now().hour())
    }

    /// Apply now, then keep re-applying at every 06:00/18:00 boundary.
    pub fn schedule_next_switch(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Zoned::now();
                self.apply_at(now.datetime());

                let wait = match time_until_next_switch(&now) {
                    Ok(wait) => wait,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to compute next theme switch");
                        return;
                    }
                };
                tracing::debug!(seconds = wait.as_secs(), "Next theme switch scheduled");
                tokio::time::sleep(wait).await;
            }
        })
    }
}

/// Wall-clock time from `now` until the next theme boundary
pub fn time_until_next_switch(now: &Zoned) -> Result<StdDuration, jiff::Error> {
    let next = next_switch_after(now.datetime())?.to_zoned(now.time_zone().clone())?;
    let millis = next.timestamp().as_millisecond() - now.timestamp().as_millisecond();
    // Never spin: a boundary that resolves to the past waits a second
    Ok(StdDuration::from_millis(millis.max(1000) as u64))
}

/// Next boundary after the current local time
pub fn next_switch_now() -> Result<Zoned, jiff::Error> {
    let now = Zoned::now();
    next_switch_after(now.datetime())?.to_zoned(now.time_zone().clone())
}
