//! Spoken and haptic notification of a classification result

use crate::error::SpeechError;
use crate::haptic::HapticDevice;
use crate::job::SynthesisJobClient;
use crate::playback::manager::PlaybackManager;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Delivers one piece of feedback to the user
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Speak `text`, pulsing the haptic device first when `is_hazard`.
    ///
    /// Returns the URL handed to playback. A failure ends this
    /// notification only; nothing is retried.
    async fn notify(&self, text: &str, is_hazard: bool) -> Result<String, SpeechError>;
}

/// Haptic pulse, then synthesis, then playback
pub struct NotificationOrchestrator {
    haptic: Arc<dyn HapticDevice>,
    pulse: Duration,
    synthesis: SynthesisJobClient,
    playback: Arc<PlaybackManager>,
}

impl NotificationOrchestrator {
    pub fn new(
        haptic: Arc<dyn HapticDevice>,
        pulse: Duration,
        synthesis: SynthesisJobClient,
        playback: Arc<PlaybackManager>,
    ) -> Self {
        Self {
            haptic,
            pulse,
            synthesis,
            playback,
        }
    }

    pub fn playback(&self) -> &Arc<PlaybackManager> {
        &self.playback
    }

    /// Fire the hazard pulse without holding up speech
    fn pulse_haptic(&self) {
        let haptic = self.haptic.clone();
        let requested = self.pulse;

        tokio::spawn(async move {
            if !haptic.has_vibrator() {
                warn!("Device does not have a vibrator");
                return;
            }

            let duration = haptic.pulse_duration(requested);
            debug!("Triggering {:?} haptic pulse", duration);
            if let Err(e) = haptic.pulse(duration).await {
                warn!("Haptic pulse failed: {}", e);
            }
        });
    }
}

#[async_trait]
impl Notifier for NotificationOrchestrator {
    async fn notify(&self, text: &str, is_hazard: bool) -> Result<String, SpeechError> {
        if is_hazard {
            self.pulse_haptic();
        }

        let url = self.synthesis.synthesize(text).await?;
        info!("Speech ready at {}", url);

        self.playback.play(&url)?;
        Ok(url)
    }
}
