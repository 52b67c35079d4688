// src/proctoring/devtools.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{Signals, Violation};

/// Devtools detection strategy.
///
/// Every strategy is a heuristic. False positives (a narrow window, a slow
/// machine) and false negatives (undocked devtools) are accepted; replace the
/// strategy rather than tuning the monitor.
pub trait DevToolsProbe: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_open(&self) -> bool;
}

/// Window geometry of the host page, in CSS pixels.
pub trait WindowMetrics: Send + Sync {
    fn outer_size(&self) -> (u32, u32);

    fn inner_size(&self) -> (u32, u32);
}

/// A docked devtools panel shrinks the viewport but not the window.
pub struct WindowSizeProbe {
    metrics: Arc<dyn WindowMetrics>,
    threshold: u32,
}

impl WindowSizeProbe {
    pub fn new(metrics: Arc<dyn WindowMetrics>, threshold: u32) -> Self {
        Self { metrics, threshold }
    }
}

impl DevToolsProbe for WindowSizeProbe {
    fn name(&self) -> &'static str {
        "window-size"
    }

    fn is_open(&self) -> bool {
        let (outer_w, outer_h) = self.metrics.outer_size();
        let (inner_w, inner_h) = self.metrics.inner_size();
        outer_w.saturating_sub(inner_w) > self.threshold
            || outer_h.saturating_sub(inner_h) > self.threshold
    }
}

/// Times a checkpoint that only stalls when a debugger is attached
/// (a `debugger;` statement in a browser).
pub struct TimingProbe {
    checkpoint: Arc<dyn Fn() + Send + Sync>,
    threshold: Duration,
}

impl TimingProbe {
    pub fn new(checkpoint: Arc<dyn Fn() + Send + Sync>, threshold: Duration) -> Self {
        Self {
            checkpoint,
            threshold,
        }
    }
}

impl DevToolsProbe for TimingProbe {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn is_open(&self) -> bool {
        let started = Instant::now();
        (self.checkpoint)();
        started.elapsed() > self.threshold
    }
}

/// Probe for hosts without developer tools.
pub struct NeverOpen;

impl DevToolsProbe for NeverOpen {
    fn name(&self) -> &'static str {
        "never"
    }

    fn is_open(&self) -> bool {
        false
    }
}

/// Polls a [`DevToolsProbe`] and reports each closed -> open transition.
pub struct DevToolsMonitor {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl DevToolsMonitor {
    pub(crate) fn start(
        probe: Arc<dyn DevToolsProbe>,
        signals: Signals,
        poll_interval: Duration,
        token: CancellationToken,
        handle: &Handle,
    ) -> Self {
        tracing::debug!(probe = probe.name(), ?poll_interval, "devtools monitor started");
        let task = handle.spawn(poll(probe, signals, poll_interval, token.clone()));
        Self {
            token,
            task: Some(task),
        }
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for DevToolsMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll(
    probe: Arc<dyn DevToolsProbe>,
    signals: Signals,
    poll_interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut was_open = false;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let open = probe.is_open();
        if open == was_open {
            continue;
        }
        was_open = open;

        if !signals.update(|s| s.dev_tools_open = open) {
            break;
        }
        if open {
            tracing::warn!(probe = probe.name(), "developer tools detected");
            signals.report(Violation::DevToolsOpen);
        }
    }
}
