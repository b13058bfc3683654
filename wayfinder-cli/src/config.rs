//! Application configuration: file, then environment, then validation

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use wayfinder_eye::{CaptureConfig, VisionConfig};
use wayfinder_spk::{HapticConfig, PlaybackConfig, SynthesisConfig};

pub const ENV_VISION_API_KEY: &str = "WAYFINDER_VISION_API_KEY";
pub const ENV_SYNTHESIS_API_KEY: &str = "WAYFINDER_SYNTHESIS_API_KEY";
pub const ENV_VISION_ENDPOINT: &str = "WAYFINDER_VISION_ENDPOINT";
pub const ENV_SYNTHESIS_ENDPOINT: &str = "WAYFINDER_SYNTHESIS_ENDPOINT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid {section} config: {message}")]
    Invalid { section: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub vision: VisionConfig,
    pub synthesis: SynthesisConfig,
    pub haptic: HapticConfig,
    pub playback: PlaybackConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        content.parse()
    }

    /// Overlay API keys and endpoints from the environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty(ENV_VISION_API_KEY) {
            self.vision.api_key = Some(key);
        }
        if let Some(key) = non_empty(ENV_SYNTHESIS_API_KEY) {
            self.synthesis.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty(ENV_VISION_ENDPOINT) {
            self.vision.endpoint = endpoint;
        }
        if let Some(endpoint) = non_empty(ENV_SYNTHESIS_ENDPOINT) {
            self.synthesis.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sections: [(&'static str, Result<(), String>); 5] = [
            ("capture", self.capture.validate()),
            ("vision", self.vision.validate()),
            ("synthesis", self.synthesis.validate()),
            ("haptic", self.haptic.validate()),
            ("playback", self.playback.validate()),
        ];

        for (section, result) in sections {
            result.map_err(|message| ConfigError::Invalid { section, message })?;
        }
        Ok(())
    }

    /// TOML rendering with API keys masked
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut shown = self.clone();
        for key in [&mut shown.vision.api_key, &mut shown.synthesis.api_key] {
            if key.is_some() {
                *key = Some("***".to_string());
            }
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    /// TOML first, JSON as a fallback
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let toml_err = match toml::from_str::<AppConfig>(content) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };

        serde_json::from_str::<AppConfig>(content)
            .map_err(|json_err| ConfigError::Parse(format!("not TOML ({}) nor JSON ({})", toml_err, json_err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.capture.interval(), Duration::from_secs(5));
        assert_eq!(config.haptic.pulse(), Duration::from_millis(500));
        assert_eq!(config.synthesis.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = r#"
            [capture]
            interval_secs = 3

            [synthesis]
            voice = "am_adam"
        "#
        .parse()
        .unwrap();

        assert_eq!(config.capture.interval_secs, 3);
        assert_eq!(config.synthesis.voice, "am_adam");
        assert_eq!(config.synthesis.model, "Kokoro");
        assert_eq!(config.vision.model, "google/gemma-3n-E4B-it");
    }

    #[test]
    fn test_parse_json_fallback() {
        let config: AppConfig = r#"{"playback": {"program": "mpv", "args": ["--no-video"]}}"#.parse().unwrap();
        assert_eq!(config.playback.program, "mpv");
        assert_eq!(config.playback.args, vec!["--no-video".to_string()]);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!("capture = [".parse::<AppConfig>(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[haptic]\npulse_ms = 250").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.haptic.pulse_ms, 250);

        assert!(matches!(
            AppConfig::from_file(Path::new("/nonexistent/wayfinder.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_env_overlay() {
        let env: HashMap<&str, &str> = [
            (ENV_VISION_API_KEY, "vk"),
            (ENV_SYNTHESIS_API_KEY, "sk"),
            (ENV_SYNTHESIS_ENDPOINT, "http://127.0.0.1:9000"),
            (ENV_VISION_ENDPOINT, " "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.vision.api_key.as_deref(), Some("vk"));
        assert_eq!(config.synthesis.api_key.as_deref(), Some("sk"));
        assert_eq!(config.synthesis.endpoint, "http://127.0.0.1:9000");
        assert_eq!(config.vision.endpoint, VisionConfig::default().endpoint);
    }

    #[test]
    fn test_validation_names_section() {
        let mut config = AppConfig::default();
        config.synthesis.poll_interval_ms = 0;
        match config.validate() {
            Err(ConfigError::Invalid { section, .. }) => assert_eq!(section, "synthesis"),
            other => panic!("Expected synthesis error, got {other:?}"),
        }
    }

    #[test]
    fn test_to_toml_masks_keys_and_round_trips() {
        let mut config = AppConfig::default();
        config.vision.api_key = Some("secret".to_string());

        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[synthesis]"));

        let parsed: AppConfig = rendered.parse().unwrap();
        assert_eq!(parsed.vision.api_key.as_deref(), Some("***"));
        assert_eq!(parsed.capture.interval_secs, 5);
    }
}
