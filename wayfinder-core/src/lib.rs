//! wayfinder-core: shared types for the wayfinder pipeline
//!
//! Holds the data that flows between the vision side (`wayfinder-eye`)
//! and the speech side (`wayfinder-spk`): captured images, their
//! classification, and the workspace-wide error type.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{is_hazard, Classification, ImageSample, HAZARD_MARKER};
