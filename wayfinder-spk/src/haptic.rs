//! Haptic feedback devices

use crate::error::HapticError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Pulse length used by devices without one-shot effect support
pub const LEGACY_PULSE: Duration = Duration::from_millis(200);

/// A device that can vibrate
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HapticDevice: Send + Sync {
    /// Whether the device has a vibrator at all
    fn has_vibrator(&self) -> bool;

    /// Pulse length the device will actually produce for `requested`
    fn pulse_duration(&self, requested: Duration) -> Duration {
        requested
    }

    /// Vibrate once for `duration`
    async fn pulse(&self, duration: Duration) -> Result<(), HapticError>;
}

/// Haptic stand-in that records pulses in the log
#[derive(Debug, Clone)]
pub struct LogHaptic {
    one_shot_effects: bool,
}

impl LogHaptic {
    pub fn new() -> Self {
        Self {
            one_shot_effects: true,
        }
    }

    /// A device limited to its fixed legacy pulse
    pub fn legacy() -> Self {
        Self {
            one_shot_effects: false,
        }
    }
}

impl Default for LogHaptic {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HapticDevice for LogHaptic {
    fn has_vibrator(&self) -> bool {
        true
    }

    fn pulse_duration(&self, requested: Duration) -> Duration {
        if self.one_shot_effects {
            requested
        } else {
            LEGACY_PULSE
        }
    }

    async fn pulse(&self, duration: Duration) -> Result<(), HapticError> {
        info!("Haptic pulse: {} ms", duration.as_millis());
        Ok(())
    }
}
