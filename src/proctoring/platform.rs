// src/proctoring/platform.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::devtools::{DevToolsProbe, NeverOpen};
use super::events::{EventBus, EventTarget, PageEvent};
use crate::error::AppError;

/// Fullscreen API of the host page.
#[async_trait]
pub trait FullscreenApi: Send + Sync {
    fn is_fullscreen(&self) -> bool;

    async fn request_fullscreen(&self) -> Result<(), AppError>;
}

/// Blocking user-facing warning (a modal alert in a browser).
pub trait Alerter: Send + Sync {
    fn alert(&self, message: &str);
}

/// Camera permission/stream request.
#[async_trait]
pub trait CameraAccess: Send + Sync {
    /// Resolves once the user answered the permission prompt and a stream opened.
    async fn request_stream(&self) -> Result<(), AppError>;
}

/// Host capabilities the proctoring layer is built on.
#[derive(Clone)]
pub struct Platform {
    pub events: Arc<dyn EventTarget>,
    pub fullscreen: Arc<dyn FullscreenApi>,
    pub alerts: Arc<dyn Alerter>,
    pub camera: Arc<dyn CameraAccess>,
    pub devtools: Arc<dyn DevToolsProbe>,
}

impl Platform {
    /// Platform backed by an [`EventBus`] with a simulated fullscreen state,
    /// log-only alerts, an always-granted camera and no devtools probe.
    pub fn headless(bus: Arc<EventBus>) -> Self {
        Self {
            events: bus.clone(),
            fullscreen: Arc::new(HeadlessFullscreen::new(bus)),
            alerts: Arc::new(LogAlerter),
            camera: Arc::new(StaticCamera::granted()),
            devtools: Arc::new(NeverOpen),
        }
    }

    pub fn with_alerts(mut self, alerts: Arc<dyn Alerter>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_camera(mut self, camera: Arc<dyn CameraAccess>) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_devtools(mut self, probe: Arc<dyn DevToolsProbe>) -> Self {
        self.devtools = probe;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: Arc<dyn FullscreenApi>) -> Self {
        self.fullscreen = fullscreen;
        self
    }
}

/// Fullscreen state kept in memory; entering and leaving dispatch
/// `FullscreenChange` on the bus the way a browser would.
pub struct HeadlessFullscreen {
    bus: Arc<EventBus>,
    active: AtomicBool,
}

impl HeadlessFullscreen {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            active: AtomicBool::new(false),
        }
    }

    /// Simulates the user pressing Escape.
    pub fn exit(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.bus
                .dispatch(PageEvent::FullscreenChange { fullscreen: false });
        }
    }
}

#[async_trait]
impl FullscreenApi for HeadlessFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn request_fullscreen(&self) -> Result<(), AppError> {
        if !self.active.swap(true, Ordering::SeqCst) {
            self.bus
                .dispatch(PageEvent::FullscreenChange { fullscreen: true });
        }
        Ok(())
    }
}

pub struct LogAlerter;

impl Alerter for LogAlerter {
    fn alert(&self, message: &str) {
        tracing::warn!(alert = message, "proctoring alert");
    }
}

/// Camera that answers every request the same way.
pub struct StaticCamera {
    granted: bool,
}

impl StaticCamera {
    pub fn granted() -> Self {
        Self { granted: true }
    }

    pub fn denied() -> Self {
        Self { granted: false }
    }
}

#[async_trait]
impl CameraAccess for StaticCamera {
    async fn request_stream(&self) -> Result<(), AppError> {
        if self.granted {
            Ok(())
        } else {
            Err(AppError::Camera("Permission denied".to_string()))
        }
    }
}
