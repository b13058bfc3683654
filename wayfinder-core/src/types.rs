//! Data model shared by every stage of the pipeline

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix the vision model uses to flag an obstacle. Matched case-sensitively.
pub const HAZARD_MARKER: &str = "WARNING";

/// A single captured frame, already encoded as JPEG by the camera.
///
/// Owned by exactly one analysis workflow and dropped once classified.
#[derive(Debug, Clone)]
pub struct ImageSample {
    bytes: Bytes,
    captured_at: DateTime<Utc>,
}

impl ImageSample {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self::captured_at(bytes, Utc::now())
    }

    pub fn captured_at(bytes: impl Into<Bytes>, captured_at: DateTime<Utc>) -> Self {
        Self {
            bytes: bytes.into(),
            captured_at,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of classifying one vision response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    text: String,
    is_hazard: bool,
}

impl Classification {
    /// Classify a vision response. The hazard flag is derived once here.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let is_hazard = is_hazard(&text);
        Self { text, is_hazard }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_hazard(&self) -> bool {
        self.is_hazard
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// True when `text` begins with [`HAZARD_MARKER`].
pub fn is_hazard(text: &str) -> bool {
    text.starts_with(HAZARD_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_prefix_is_hazard() {
        assert!(is_hazard("WARNING! Dog ahead at 2 meters"));
        assert!(is_hazard("WARNING"));
        assert!(is_hazard("WARNINGS everywhere"));
    }

    #[test]
    fn test_non_warning_is_not_hazard() {
        assert!(!is_hazard("Path is clear."));
        assert!(!is_hazard("warning! lowercase"));
        assert!(!is_hazard("Warning: mixed case"));
        assert!(!is_hazard(" WARNING leading space"));
        assert!(!is_hazard("There is a WARNING sign ahead"));
        assert!(!is_hazard(""));
    }

    #[test]
    fn test_classification_keeps_full_text() {
        let c = Classification::from_text("WARNING! Stairs down in 1 meter");
        assert!(c.is_hazard());
        assert_eq!(c.text(), "WARNING! Stairs down in 1 meter");

        let c = Classification::from_text("The path is clear for now.");
        assert!(!c.is_hazard());
        assert_eq!(c.into_text(), "The path is clear for now.");
    }

    #[test]
    fn test_image_sample_accessors() {
        let at = Utc::now();
        let sample = ImageSample::captured_at(vec![0xff, 0xd8, 0xff], at);
        assert_eq!(sample.len(), 3);
        assert!(!sample.is_empty());
        assert_eq!(sample.timestamp(), at);
        assert_eq!(&sample.bytes()[..], &[0xff, 0xd8, 0xff]);
    }
}
