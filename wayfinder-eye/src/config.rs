//! Configuration for capture and vision analysis

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Instruction sent with every image
pub const DEFAULT_PROMPT: &str = "You are a helpful crucial assistant helping a visually impaired person. \
Please tell this person if there is an obstacle ahead. Give your instructions as shortly as possible. \
Start with WARNING if there is an obstacle reachable within 3 seconds. Precise what obstacle it is. \
Don't give unnecessary warnings if the path ahead is clear enough. \
For example 'The path is clear for now.', or 'WARNING! Dog ahead at 2 meters'";

/// Periodic capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds between the start of consecutive ticks
    pub interval_secs: u64,

    /// Directory the file-backed camera reads JPEG frames from
    pub image_dir: PathBuf,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            image_dir: PathBuf::from("./captures"),
        }
    }
}

impl CaptureConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interval_secs == 0 {
            return Err("Capture interval must be greater than 0".to_string());
        }
        if self.interval_secs > 3600 {
            return Err("Capture interval too large (max 3600 seconds)".to_string());
        }
        if self.image_dir.as_os_str().is_empty() {
            return Err("Image directory cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Remote vision model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Base URL of the chat-completions style API
    pub endpoint: String,

    /// Bearer token sent with every request
    pub api_key: Option<String>,

    /// Vision-capable model id
    pub model: String,

    /// Instruction placed before the image
    pub prompt: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.together.xyz/v1".to_string(),
            api_key: None,
            model: "google/gemma-3n-E4B-it".to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl VisionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("Vision endpoint cannot be empty".to_string());
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err("Vision endpoint must be an http(s) URL".to_string());
        }
        if self.endpoint.chars().any(|c| c.is_control()) {
            return Err("Vision endpoint contains invalid characters".to_string());
        }

        if self.model.is_empty() {
            return Err("Vision model cannot be empty".to_string());
        }
        if self.model.len() > 256 {
            return Err("Vision model too long (max 256 chars)".to_string());
        }

        if self.prompt.trim().is_empty() {
            return Err("Vision prompt cannot be empty".to_string());
        }
        if self.prompt.len() > 10_000 {
            return Err("Vision prompt too long (max 10000 chars)".to_string());
        }

        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err("Vision timeout must be between 1 and 300 seconds".to_string());
        }

        Ok(())
    }
}
