//! Desktop toast notifications using notify-rust

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

/// How long a toast stays on screen
const DEFAULT_TIMEOUT_MS: u32 = 3000;

/// Short-lived desktop notifications
pub struct NotifyRustNotifier {
    app_name: String,
    timeout_ms: u32,
}

impl NotifyRustNotifier {
    pub fn new() -> Self {
        Self {
            app_name: "Voice Memo".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Override how long toasts stay visible
    pub fn with_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn build(&self, title: &str, message: &str, icon: NotificationIcon) -> Notification {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(message)
            .icon(icon.icon_name())
            .timeout(Timeout::Milliseconds(self.timeout_ms));
        notification
    }
}

impl Default for NotifyRustNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotifyRustNotifier {
    async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        let notification = self.build(title, message, icon);

        // show() talks to the notification daemon synchronously
        tokio::task::spawn_blocking(move || {
            notification
                .show()
                .map(|_| ())
                .map_err(|e| NotificationError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| NotificationError::SendFailed(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_toast_with_icon() {
        let notifier = NotifyRustNotifier::new();
        let toast = notifier.build("Voice Memo", "Recording saved", NotificationIcon::Success);
        assert_eq!(toast.summary, "Voice Memo");
        assert_eq!(toast.body, "Recording saved");
        assert_eq!(toast.appname, "Voice Memo");
    }

    #[test]
    fn custom_timeout() {
        let notifier = NotifyRustNotifier::default().with_timeout_ms(500);
        assert_eq!(notifier.timeout_ms, 500);
    }
}
