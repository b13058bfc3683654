//! wayfinder-eye: scene capture and hazard analysis
//!
//! Periodically captures an image, asks a remote vision model to describe
//! it, classifies the answer and hands it to the speech side for feedback.

pub mod analysis;
pub mod assistant;
pub mod camera;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod vision;

pub use analysis::AnalysisWorkflow;
pub use assistant::VisualAssistant;
pub use camera::{Camera, DirectoryCamera};
pub use config::{CaptureConfig, VisionConfig, DEFAULT_PROMPT};
pub use error::{AcquisitionError, AnalysisError};
pub use scheduler::{CaptureHandler, CaptureScheduler};
pub use vision::{HttpVisionService, VisionService};
