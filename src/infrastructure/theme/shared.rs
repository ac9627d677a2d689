use std::sync::RwLock;

use crate::application::ports::ThemeSink;
use crate::domain::theme::Theme;

/// Process-wide theme setting reported by `daemon status`
#[derive(Debug, Default)]
pub struct SharedThemeSink {
    current: RwLock<Option<Theme>>,
}

impl SharedThemeSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThemeSink for SharedThemeSink {
    fn current(&self) -> Option<Theme> {
        *self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, theme: Theme) {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(theme);
    }
}
