//! The assembled capture-analyze-notify pipeline

use crate::analysis::AnalysisWorkflow;
use crate::camera::Camera;
use crate::scheduler::CaptureScheduler;
use crate::vision::VisionService;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wayfinder_spk::{NotificationOrchestrator, PlaybackManager};

/// Owns the capture session and the playback resource for one user
pub struct VisualAssistant {
    scheduler: CaptureScheduler,
    playback: Arc<PlaybackManager>,
}

impl VisualAssistant {
    pub fn new(
        camera: Arc<dyn Camera>,
        vision: Arc<dyn VisionService>,
        notifier: Arc<NotificationOrchestrator>,
        interval: Duration,
    ) -> wayfinder_core::Result<Self> {
        let playback = notifier.playback().clone();
        let workflow = Arc::new(AnalysisWorkflow::new(vision, notifier));
        Ok(Self {
            scheduler: CaptureScheduler::new(camera, workflow, interval)?,
            playback,
        })
    }

    pub fn start(&self) -> bool {
        self.scheduler.start()
    }

    pub fn stop(&self) -> bool {
        self.scheduler.stop()
    }

    /// Start when stopped, stop when running. Returns the new state.
    pub fn toggle(&self) -> bool {
        self.scheduler.toggle()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn scheduler(&self) -> &CaptureScheduler {
        &self.scheduler
    }

    pub fn playback(&self) -> &Arc<PlaybackManager> {
        &self.playback
    }

    /// Stop capturing and free the audio output.
    ///
    /// Workflows already in flight are left to finish; their playback
    /// requests are refused once the manager is released.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        self.playback.release();
        info!("Visual assistant shut down");
    }
}
