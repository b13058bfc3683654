//! wayfinder-spk: spoken and haptic feedback
//!
//! Provides the speech side of the pipeline:
//! - Remote speech synthesis via a submit-then-poll job protocol
//! - A single-owner audio playback manager
//! - Haptic pulses for hazards
//! - The notification orchestrator that ties the three together

pub mod config;
pub mod error;
pub mod haptic;
pub mod job;
pub mod notifier;
pub mod playback;
pub mod service;

pub use config::{HapticConfig, PlaybackConfig, SynthesisConfig};
pub use error::{HapticError, PlaybackError, SpeechError, SynthesisError};
pub use haptic::{HapticDevice, LogHaptic};
pub use job::{JobOutcome, JobState, JobStatus, SynthesisJob, SynthesisJobClient};
pub use notifier::{NotificationOrchestrator, Notifier};
pub use playback::command::CommandPlayer;
pub use playback::manager::PlaybackManager;
pub use playback::{
    AudioAttributes, PlaybackBackend, PlaybackEvent, PlaybackResource, PlaybackSignal,
    PlaybackState,
};
pub use service::{HttpSynthesisService, JobStatusReport, SynthesisService};
