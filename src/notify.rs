//! Gate notifications.

use std::process::Command;

/// Delivers a short message to the developer.
pub trait Notifier {
    /// Shows `message` under `title`. Delivery failures are logged, never
    /// returned.
    fn notify(&self, title: &str, message: &str);
}

/// Desktop notifications via `notify-send` (Linux) or `osascript` (macOS).
///
/// Falls back to a log line when neither is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, message: &str) {
        let result = if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {} with title {}",
                applescript_string(message),
                applescript_string(title)
            );
            Command::new("osascript").args(["-e", &script]).status()
        } else {
            Command::new("notify-send").args([title, message]).status()
        };

        match result {
            Ok(status) if status.success() => {}
            Ok(status) => {
                tracing::debug!(code = ?status.code(), "Notifier exited with failure");
                LogNotifier.notify(title, message);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Desktop notifier unavailable");
                LogNotifier.notify(title, message);
            }
        }
    }
}

fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Writes notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        tracing::warn!(title, "{}", message);
    }
}

/// Picks the notifier for the `allowNotify` setting.
#[must_use]
pub fn notifier_for(allow_notify: bool) -> Box<dyn Notifier> {
    if allow_notify {
        Box::new(DesktopNotifier)
    } else {
        Box::new(LogNotifier)
    }
}
