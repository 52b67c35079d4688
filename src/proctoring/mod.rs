// src/proctoring/mod.rs

//! Exam-integrity enforcement.
//!
//! [`Proctoring::activate`] composes the individual monitors behind one
//! activation point and returns an [`ActiveProctoring`] handle. The handle
//! exposes a merged [`ProctoringStatus`] snapshot and a stream of
//! [`Violation`]s; dropping it (or calling [`ActiveProctoring::deactivate`])
//! detaches every listener, stops every timer and discards late camera
//! results.

pub mod camera;
pub mod devtools;
pub mod events;
pub mod fullscreen;
pub mod guards;
pub mod platform;
pub mod tab_focus;

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::{config::Timings, error::AppError};

use self::{
    camera::CameraMonitor,
    devtools::DevToolsMonitor,
    fullscreen::FullscreenMonitor,
    guards::{GuardKind, InputGuard},
    platform::Platform,
    tab_focus::TabFocusMonitor,
};

pub const FULLSCREEN_EXIT_WARNING: &str = "Warning: You cannot exit fullscreen mode during the test!";
pub const DEVTOOLS_TERMINATION: &str = "Developer tools detected! Your test will be terminated.";
pub const CAMERA_TERMINATION: &str = "Webcam access is required! Your test will be terminated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CamStatus {
    Allowed,
    Blocked,
    Pending,
}

/// Merged proctoring snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProctoringStatus {
    pub full_screen_ok: bool,
    pub tab_focused: bool,
    pub tab_switches: u32,
    pub dev_tools_open: bool,
    pub cam_status: CamStatus,
}

impl Default for ProctoringStatus {
    fn default() -> Self {
        Self {
            full_screen_ok: true,
            tab_focused: true,
            tab_switches: 0,
            dev_tools_open: false,
            cam_status: CamStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    FullscreenExit,
    TabSwitch { count: u32 },
    DevToolsOpen,
    CameraBlocked,
}

impl Violation {
    /// Fatal violations force an immediate submission.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Violation::DevToolsOpen | Violation::CameraBlocked)
    }

    pub fn termination_message(&self) -> Option<&'static str> {
        match self {
            Violation::DevToolsOpen => Some(DEVTOOLS_TERMINATION),
            Violation::CameraBlocked => Some(CAMERA_TERMINATION),
            _ => None,
        }
    }
}

/// Which monitors to run. All disabled by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProctoringOptions {
    pub prevent_tab_switch: bool,
    pub force_full_screen: bool,
    pub prevent_context_menu: bool,
    pub prevent_user_selection: bool,
    pub prevent_copy: bool,
    pub detect_dev_tools: bool,
    pub require_camera: bool,
}

impl ProctoringOptions {
    pub fn all() -> Self {
        Self {
            prevent_tab_switch: true,
            force_full_screen: true,
            prevent_context_menu: true,
            prevent_user_selection: true,
            prevent_copy: true,
            detect_dev_tools: true,
            require_camera: true,
        }
    }
}

/// Write side shared by the monitors.
///
/// Every write goes through the gate; once [`Signals::close`] returns, no
/// status change or violation can land, even from a task that was already
/// running when teardown began.
#[derive(Clone)]
pub(crate) struct Signals {
    inner: Arc<SignalsInner>,
}

struct SignalsInner {
    open: Mutex<bool>,
    status: watch::Sender<ProctoringStatus>,
    violations: mpsc::UnboundedSender<Violation>,
}

impl Signals {
    pub(crate) fn new(
        initial: ProctoringStatus,
    ) -> (Self, watch::Receiver<ProctoringStatus>, mpsc::UnboundedReceiver<Violation>) {
        let (status, status_rx) = watch::channel(initial);
        let (violations, violations_rx) = mpsc::unbounded_channel();
        let signals = Self {
            inner: Arc::new(SignalsInner {
                open: Mutex::new(true),
                status,
                violations,
            }),
        };
        (signals, status_rx, violations_rx)
    }

    /// Applies `change` to the status; returns false once closed.
    pub(crate) fn update(&self, change: impl FnOnce(&mut ProctoringStatus)) -> bool {
        let open = self.inner.open.lock().unwrap_or_else(PoisonError::into_inner);
        if !*open {
            return false;
        }
        self.inner.status.send_modify(change);
        true
    }

    pub(crate) fn report(&self, violation: Violation) -> bool {
        let open = self.inner.open.lock().unwrap_or_else(PoisonError::into_inner);
        if !*open {
            return false;
        }
        tracing::info!(?violation, fatal = violation.is_fatal(), "proctoring violation");
        self.inner.violations.send(violation).is_ok()
    }

    pub(crate) fn close(&self) {
        *self.inner.open.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    pub(crate) fn is_open(&self) -> bool {
        *self.inner.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Proctoring;

impl Proctoring {
    /// Starts every monitor enabled in `options`.
    /// Must be called from within a tokio runtime.
    pub fn activate(
        platform: &Platform,
        options: ProctoringOptions,
        timings: &Timings,
    ) -> Result<ActiveProctoring, AppError> {
        let handle = Handle::try_current()
            .map_err(|_| AppError::InvalidState("proctoring requires a tokio runtime".to_string()))?;

        let initial = ProctoringStatus {
            full_screen_ok: !options.force_full_screen || platform.fullscreen.is_fullscreen(),
            ..ProctoringStatus::default()
        };
        let (signals, status_rx, violations) = Signals::new(initial);
        let token = CancellationToken::new();

        let fullscreen = options.force_full_screen.then(|| {
            FullscreenMonitor::start(
                platform,
                signals.clone(),
                timings.fullscreen_retry_delay,
                token.child_token(),
                handle.clone(),
            )
        });

        let tab_focus = options
            .prevent_tab_switch
            .then(|| TabFocusMonitor::start(&platform.events, signals.clone()));

        let devtools = options.detect_dev_tools.then(|| {
            DevToolsMonitor::start(
                Arc::clone(&platform.devtools),
                signals.clone(),
                timings.devtools_poll_interval,
                token.child_token(),
                &handle,
            )
        });

        let camera = options.require_camera.then(|| {
            CameraMonitor::start(
                Arc::clone(&platform.camera),
                signals.clone(),
                token.child_token(),
                &handle,
            )
        });

        let mut guards = Vec::new();
        for (enabled, kind) in [
            (options.prevent_context_menu, GuardKind::ContextMenu),
            (options.prevent_copy, GuardKind::Copy),
            (options.prevent_user_selection, GuardKind::SelectStart),
        ] {
            if enabled {
                let mut guard = InputGuard::new(Arc::clone(&platform.events), kind);
                guard.enable();
                guards.push(guard);
            }
        }

        tracing::info!(?options, "proctoring activated");

        Ok(ActiveProctoring {
            signals,
            status: status_rx,
            violations,
            token,
            fullscreen,
            tab_focus,
            devtools,
            camera,
            guards,
        })
    }
}

/// Running proctoring session. Tears everything down on drop.
pub struct ActiveProctoring {
    signals: Signals,
    status: watch::Receiver<ProctoringStatus>,
    violations: mpsc::UnboundedReceiver<Violation>,
    token: CancellationToken,
    fullscreen: Option<FullscreenMonitor>,
    tab_focus: Option<TabFocusMonitor>,
    devtools: Option<DevToolsMonitor>,
    camera: Option<CameraMonitor>,
    guards: Vec<InputGuard>,
}

impl ActiveProctoring {
    pub fn status(&self) -> ProctoringStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProctoringStatus> {
        self.status.clone()
    }

    /// Next violation, or `None` after teardown.
    pub async fn next_violation(&mut self) -> Option<Violation> {
        self.violations.recv().await
    }

    pub fn try_next_violation(&mut self) -> Option<Violation> {
        self.violations.try_recv().ok()
    }

    pub fn is_active(&self) -> bool {
        self.signals.is_open()
    }

    pub fn deactivate(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.signals.is_open() {
            return;
        }
        self.signals.close();
        self.token.cancel();

        if let Some(mut monitor) = self.fullscreen.take() {
            monitor.stop();
        }
        if let Some(mut monitor) = self.tab_focus.take() {
            monitor.stop();
        }
        if let Some(mut monitor) = self.devtools.take() {
            monitor.stop();
        }
        if let Some(mut monitor) = self.camera.take() {
            monitor.stop();
        }
        for guard in self.guards.iter_mut() {
            guard.disable();
        }
        self.guards.clear();
        self.violations.close();

        tracing::info!("proctoring deactivated");
    }
}

impl Drop for ActiveProctoring {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proctoring::events::{Disposition, EventBus, EventKind, PageEvent};
    use crate::proctoring::platform::StaticCamera;
    use std::time::Duration;

    fn timings() -> Timings {
        Timings {
            tick_interval: Duration::from_secs(1),
            fullscreen_retry_delay: Duration::from_millis(500),
            devtools_poll_interval: Duration::from_secs(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_activate_attaches_enabled_listeners_only() {
        let bus = EventBus::new();
        let platform = Platform::headless(bus.clone());
        let options = ProctoringOptions {
            prevent_copy: true,
            prevent_tab_switch: true,
            ..ProctoringOptions::default()
        };

        let active = Proctoring::activate(&platform, options, &timings()).unwrap();

        assert_eq!(bus.listener_count(EventKind::Copy), 1);
        assert_eq!(bus.listener_count(EventKind::ContextMenu), 0);
        assert_eq!(bus.listener_count(EventKind::FullscreenChange), 0);
        assert_eq!(bus.dispatch(PageEvent::Copy), Disposition::PreventDefault);
        assert_eq!(bus.dispatch(PageEvent::ContextMenu), Disposition::Continue);

        active.deactivate();
        assert_eq!(bus.total_listeners(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_merges_sub_signals() {
        let bus = EventBus::new();
        let platform = Platform::headless(bus.clone());
        let mut active =
            Proctoring::activate(&platform, ProctoringOptions::all(), &timings()).unwrap();

        assert!(!active.status().full_screen_ok);
        platform.fullscreen.request_fullscreen().await.unwrap();
        bus.dispatch(PageEvent::Blur);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let status = active.status();
        assert!(status.full_screen_ok);
        assert!(!status.tab_focused);
        assert_eq!(status.tab_switches, 1);
        assert_eq!(status.cam_status, CamStatus::Allowed);
        assert!(!status.dev_tools_open);

        assert_eq!(
            active.try_next_violation(),
            Some(Violation::TabSwitch { count: 1 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_updates_after_teardown() {
        let bus = EventBus::new();
        let platform = Platform::headless(bus.clone());
        let active = Proctoring::activate(&platform, ProctoringOptions::all(), &timings()).unwrap();
        let mut status_rx = active.subscribe();
        let before = *status_rx.borrow_and_update();

        drop(active);

        assert_eq!(bus.dispatch(PageEvent::Blur), Disposition::Continue);
        assert_eq!(bus.dispatch(PageEvent::Copy), Disposition::Continue);
        bus.dispatch(PageEvent::FullscreenChange { fullscreen: false });
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(bus.total_listeners(), 0);
        assert_eq!(*status_rx.borrow(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_camera_is_fatal() {
        let bus = EventBus::new();
        let platform = Platform::headless(bus).with_camera(Arc::new(StaticCamera::denied()));
        let options = ProctoringOptions {
            require_camera: true,
            ..ProctoringOptions::default()
        };
        let mut active = Proctoring::activate(&platform, options, &timings()).unwrap();

        let violation = active.next_violation().await.unwrap();
        assert_eq!(violation, Violation::CameraBlocked);
        assert!(violation.is_fatal());
        assert_eq!(active.status().cam_status, CamStatus::Blocked);
    }

    #[test]
    fn test_violation_classification() {
        assert!(!Violation::FullscreenExit.is_fatal());
        assert!(!Violation::TabSwitch { count: 3 }.is_fatal());
        assert!(Violation::DevToolsOpen.is_fatal());
        assert_eq!(
            Violation::CameraBlocked.termination_message(),
            Some(CAMERA_TERMINATION)
        );
        assert_eq!(Violation::FullscreenExit.termination_message(), None);
    }

    #[test]
    fn test_activate_outside_runtime_fails() {
        let platform = Platform::headless(EventBus::new());
        let result = Proctoring::activate(&platform, ProctoringOptions::all(), &timings());
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }
}
