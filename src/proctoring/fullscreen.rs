// src/proctoring/fullscreen.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use super::{
    FULLSCREEN_EXIT_WARNING, Signals, Violation,
    events::{Disposition, EventKind, PageEvent, Subscription},
    platform::{FullscreenApi, Platform},
};

/// Re-enters fullscreen whenever the page leaves it.
///
/// Each exit reports a `FullscreenExit` violation, shows the blocking warning
/// and schedules a new request after `retry_delay`. The delay keeps the
/// browser from rejecting back-to-back requests.
pub struct FullscreenMonitor {
    subscription: Option<Subscription>,
    token: CancellationToken,
}

impl FullscreenMonitor {
    pub(crate) fn start(
        platform: &Platform,
        signals: Signals,
        retry_delay: Duration,
        token: CancellationToken,
        handle: Handle,
    ) -> Self {
        let fullscreen = Arc::clone(&platform.fullscreen);
        let alerts = Arc::clone(&platform.alerts);
        let listener_token = token.clone();

        let subscription = Subscription::listen(
            &platform.events,
            EventKind::FullscreenChange,
            move |event| {
                let PageEvent::FullscreenChange { fullscreen: entered } = *event else {
                    return Disposition::Continue;
                };
                if listener_token.is_cancelled() {
                    return Disposition::Continue;
                }

                if entered {
                    signals.update(|s| s.full_screen_ok = true);
                    return Disposition::Continue;
                }

                signals.update(|s| s.full_screen_ok = false);
                signals.report(Violation::FullscreenExit);
                alerts.alert(FULLSCREEN_EXIT_WARNING);

                handle.spawn(request_after_delay(
                    Arc::clone(&fullscreen),
                    retry_delay,
                    listener_token.clone(),
                ));
                Disposition::Continue
            },
        );

        Self {
            subscription: Some(subscription),
            token,
        }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        self.subscription.take();
    }
}

impl Drop for FullscreenMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn request_after_delay(
    fullscreen: Arc<dyn FullscreenApi>,
    delay: Duration,
    token: CancellationToken,
) {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::debug!("fullscreen re-request cancelled");
        }
        _ = tokio::time::sleep(delay) => {
            if let Err(e) = fullscreen.request_fullscreen().await {
                tracing::warn!(error = %e, "Fullscreen request denied");
            }
        }
    }
}
