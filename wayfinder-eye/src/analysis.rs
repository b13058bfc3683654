//! Per-capture analysis workflow
//!
//! One instance handles one image: describe it remotely, classify the text,
//! then hand it to the notifier. Any failure ends that instance only.

use crate::error::AnalysisError;
use crate::scheduler::CaptureHandler;
use crate::vision::VisionService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};
use wayfinder_core::{Classification, ImageSample};
use wayfinder_spk::Notifier;

pub struct AnalysisWorkflow {
    vision: Arc<dyn VisionService>,
    notifier: Arc<dyn Notifier>,
}

impl AnalysisWorkflow {
    pub fn new(vision: Arc<dyn VisionService>, notifier: Arc<dyn Notifier>) -> Self {
        Self { vision, notifier }
    }

    /// Classify `image` and notify the user about it.
    ///
    /// The text is always spoken; the notifier adds the haptic pulse for
    /// hazards. Notification failures are logged, not returned.
    pub async fn analyze(&self, image: ImageSample) -> Result<Classification, AnalysisError> {
        let text = self.vision.describe(&image).await?;
        drop(image);

        let classification = Classification::from_text(text);
        info!(
            hazard = classification.is_hazard(),
            "Vision analysis complete: '{}'",
            classification.text()
        );

        if let Err(e) = self
            .notifier
            .notify(classification.text(), classification.is_hazard())
            .await
        {
            warn!("Notification failed: {}", e);
        }

        Ok(classification)
    }
}

#[async_trait]
impl CaptureHandler for AnalysisWorkflow {
    async fn handle(&self, image: ImageSample) {
        if let Err(e) = self.analyze(image).await {
            error!("Vision analysis failed: {}", e);
        }
    }
}
