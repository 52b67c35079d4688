// src/proctoring/camera.rs

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{CamStatus, Signals, Violation, platform::CameraAccess};

/// Requests camera access once per activation.
///
/// The request runs under the monitor's cancellation token: once the monitor
/// stops, a pending prompt is abandoned and a late answer never reaches the
/// status.
pub struct CameraMonitor {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CameraMonitor {
    pub(crate) fn start(
        camera: Arc<dyn CameraAccess>,
        signals: Signals,
        token: CancellationToken,
        handle: &Handle,
    ) -> Self {
        signals.update(|s| s.cam_status = CamStatus::Pending);
        let task = handle.spawn(request(camera, signals, token.clone()));
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

impl Drop for CameraMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn request(camera: Arc<dyn CameraAccess>, signals: Signals, token: CancellationToken) {
    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        result = camera.request_stream() => Some(result),
    };

    let Some(result) = outcome else {
        tracing::debug!("camera request abandoned");
        return;
    };
    if token.is_cancelled() {
        tracing::debug!("late camera answer discarded");
        return;
    }

    match result {
        Ok(()) => {
            signals.update(|s| s.cam_status = CamStatus::Allowed);
            tracing::info!("camera access granted");
        }
        Err(e) => {
            tracing::warn!(error = %e, "camera access blocked");
            if signals.update(|s| s.cam_status = CamStatus::Blocked) {
                signals.report(Violation::CameraBlocked);
            }
        }
    }
}
