//! Theme settings port

use std::sync::Arc;

use crate::domain::theme::Theme;

/// Port for the process-wide theme setting
pub trait ThemeSink: Send + Sync {
    /// Currently applied theme, if any was applied
    fn current(&self) -> Option<Theme>;

    /// Apply a theme
    fn apply(&self, theme: Theme);
}

impl<T: ThemeSink + ?Sized> ThemeSink for Arc<T> {
    fn current(&self) -> Option<Theme> {
        self.as_ref().current()
    }

    fn apply(&self, theme: Theme) {
        self.as_ref().apply(theme)
    }
}
