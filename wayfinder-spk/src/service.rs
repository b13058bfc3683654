//! Remote speech synthesis service
//!
//! Synthesis is asynchronous on the provider side: a submit call returns a
//! request id, and a status endpoint reports progress until the audio is
//! available at a result URL.

use crate::config::SynthesisConfig;
use crate::error::SynthesisError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

/// Provider status string for a finished job
pub const STATUS_DONE: &str = "done";

/// Status of a synthesis request as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatusReport {
    pub status: String,
    #[serde(default)]
    pub result_url: Option<String>,
}

impl JobStatusReport {
    pub fn is_done(&self) -> bool {
        self.status == STATUS_DONE
    }
}

/// Submit/status contract of a synthesis provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SynthesisService: Send + Sync {
    /// Submit text for synthesis, returning the provider's request id
    async fn submit(&self, text: &str) -> Result<String, SynthesisError>;

    /// Fetch the current status of a submitted request
    async fn status(&self, request_id: &str) -> Result<JobStatusReport, SynthesisError>;
}

#[derive(Deserialize)]
struct SubmitResponse {
    data: RequestIdData,
}

#[derive(Deserialize)]
struct RequestIdData {
    request_id: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    data: JobStatusReport,
}

/// HTTP implementation of [`SynthesisService`]
pub struct HttpSynthesisService {
    client: Client,
    base: Url,
    api_key: Option<String>,
    model: String,
    voice: String,
    lang: String,
    speed: u32,
    format: String,
    sample_rate: u32,
}

impl HttpSynthesisService {
    pub fn new(config: &SynthesisConfig) -> Result<Self, SynthesisError> {
        let base = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|e| SynthesisError::Config(format!("Invalid endpoint '{}': {}", config.endpoint, e)))?;

        if base.cannot_be_a_base() {
            return Err(SynthesisError::Config(format!(
                "Endpoint '{}' cannot be used as a base URL",
                config.endpoint
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SynthesisError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            voice: config.voice.clone(),
            lang: config.lang.clone(),
            speed: config.speed,
            format: config.format.clone(),
            sample_rate: config.sample_rate,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header("accept", "application/json");
        match self.api_key {
            Some(ref key) => request.bearer_auth(key),
            None => request,
        }
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, SynthesisError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body = if text.len() > 500 {
        let mut cut = 500;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text[..cut].to_string()
    } else {
        text
    };

    Err(SynthesisError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SynthesisService for HttpSynthesisService {
    async fn submit(&self, text: &str) -> Result<String, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let body = json!({
            "text": text,
            "model": self.model,
            "voice": self.voice,
            "lang": self.lang,
            "speed": self.speed,
            "format": self.format,
            "sample_rate": self.sample_rate,
        });

        let url = self.endpoint(&["txt2audio"]);
        debug!("Submitting {} chars to {}", text.len(), url);

        let response = self
            .authorize(self.client.post(url))
            .json(&body)
            .send()
            .await?;
        let response = error_for_status(response).await?;

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("submit: {}", e)))?;

        if parsed.data.request_id.is_empty() {
            return Err(SynthesisError::InvalidResponse("submit: empty request_id".to_string()));
        }

        Ok(parsed.data.request_id)
    }

    async fn status(&self, request_id: &str) -> Result<JobStatusReport, SynthesisError> {
        let url = self.endpoint(&["request-status", request_id]);

        let response = self.authorize(self.client.get(url)).send().await?;
        let response = error_for_status(response).await?;

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::InvalidResponse(format!("status: {}", e)))?;

        Ok(parsed.data)
    }
}
