//! Configuration for speech synthesis, playback and haptics

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Remote speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Base URL of the synthesis API (the `txt2audio` and
    /// `request-status/{id}` endpoints live under it)
    pub endpoint: String,

    /// Bearer token sent with every request
    pub api_key: Option<String>,

    /// Synthesis model
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Language code
    pub lang: String,

    /// Speech speed multiplier
    pub speed: u32,

    /// Audio container format
    pub format: String,

    /// Output sample rate in Hz
    pub sample_rate: u32,

    /// Delay between status polls in milliseconds
    pub poll_interval_ms: u64,

    /// Job deadline measured from submission, in seconds
    pub timeout_secs: u64,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deapi.ai/api/v1/client".to_string(),
            api_key: None,
            model: "Kokoro".to_string(),
            voice: "af_alloy".to_string(),
            lang: "en-us".to_string(),
            speed: 1,
            format: "mp3".to_string(),
            sample_rate: 24_000,
            poll_interval_ms: 2_000,
            timeout_secs: 30,
            request_timeout_secs: 30,
        }
    }
}

impl SynthesisConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        validate_endpoint(&self.endpoint)?;

        for (name, value) in [
            ("model", &self.model),
            ("voice", &self.voice),
            ("lang", &self.lang),
            ("format", &self.format),
        ] {
            if value.is_empty() {
                return Err(format!("Synthesis {} cannot be empty", name));
            }
            if value.len() > 256 {
                return Err(format!("Synthesis {} too long (max 256 chars)", name));
            }
        }

        if self.speed == 0 || self.speed > 4 {
            return Err("Synthesis speed must be between 1 and 4".to_string());
        }

        if self.sample_rate < 8_000 || self.sample_rate > 48_000 {
            return Err("Sample rate must be between 8000 and 48000 Hz".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("Poll interval must be greater than 0".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Synthesis timeout must be greater than 0".to_string());
        }

        if self.timeout_secs > 300 {
            return Err("Synthesis timeout too large (max 300 seconds)".to_string());
        }

        if self.poll_interval() >= self.timeout() {
            return Err("Poll interval must be shorter than the synthesis timeout".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Haptic feedback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HapticConfig {
    /// Pulse length requested for a hazard
    pub pulse_ms: u64,
}

impl Default for HapticConfig {
    fn default() -> Self {
        Self { pulse_ms: 500 }
    }
}

impl HapticConfig {
    pub fn pulse(&self) -> Duration {
        Duration::from_millis(self.pulse_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.pulse_ms == 0 || self.pulse_ms > 5_000 {
            return Err("Haptic pulse must be between 1 and 5000 ms".to_string());
        }
        Ok(())
    }
}

/// External audio player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Player executable; the audio URL is appended as the last argument
    pub program: String,

    /// Arguments placed before the URL
    pub args: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            program: "ffplay".to_string(),
            args: vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
            ],
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("Playback program cannot be empty".to_string());
        }
        if self.program.chars().any(|c| c == '\0') || self.args.iter().any(|a| a.contains('\0')) {
            return Err("Playback command contains null bytes".to_string());
        }
        Ok(())
    }
}

pub(crate) fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    if endpoint.is_empty() {
        return Err("API endpoint cannot be empty".to_string());
    }

    if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
        return Err("API endpoint must be an http(s) URL".to_string());
    }

    if endpoint.len() > 2048 {
        return Err("API endpoint URL too long (max 2048 chars)".to_string());
    }

    if endpoint.chars().any(|c| c.is_control()) {
        return Err("API endpoint contains invalid characters".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_defaults() {
        let config = SynthesisConfig::default();
        assert_eq!(config.model, "Kokoro");
        assert_eq!(config.voice, "af_alloy");
        assert_eq!(config.lang, "en-us");
        assert_eq!(config.format, "mp3");
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_synthesis_validation_endpoint() {
        let mut config = SynthesisConfig::default();
        config.endpoint = String::new();
        assert!(config.validate().is_err());

        config.endpoint = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        config.endpoint = "http://127.0.0.1:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_synthesis_validation_timing() {
        let mut config = SynthesisConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.poll_interval_ms = 30_000;
        assert!(config.validate().is_err());

        config.poll_interval_ms = 2_000;
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.timeout_secs = 301;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_synthesis_validation_fields() {
        let mut config = SynthesisConfig::default();
        config.voice = String::new();
        assert!(config.validate().is_err());

        let mut config = SynthesisConfig::default();
        config.speed = 0;
        assert!(config.validate().is_err());

        let mut config = SynthesisConfig::default();
        config.sample_rate = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_haptic_config() {
        let config = HapticConfig::default();
        assert_eq!(config.pulse(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
        assert!(HapticConfig { pulse_ms: 0 }.validate().is_err());
    }

    #[test]
    fn test_playback_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.program, "ffplay");
        assert!(config.args.contains(&"-autoexit".to_string()));
        assert!(config.validate().is_ok());

        let config = PlaybackConfig {
            program: "  ".to_string(),
            args: vec![],
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SynthesisConfig =
            serde_json::from_str(r#"{"voice": "am_adam", "timeout_secs": 10}"#).unwrap();
        assert_eq!(config.voice, "am_adam");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.model, "Kokoro");
    }
}
