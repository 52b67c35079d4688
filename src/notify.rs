// src/notify.rs

//! Outward-facing feedback: toast-style notifications and view navigation.
//! The controller reports through these traits; rendering is up to the host.

use crate::routes::View;

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, view: View);
}

/// Notifier that only writes to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notification = message, "success");
    }

    fn error(&self, message: &str) {
        tracing::error!(notification = message, "error");
    }
}

/// Navigator that only writes to the log.
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, view: View) {
        tracing::info!(path = %view.path(), "navigate");
    }
}
