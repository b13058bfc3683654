//! Remote vision model client

use crate::config::VisionConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;
use wayfinder_core::ImageSample;

/// Describes a scene image in text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionService: Send + Sync {
    /// One request per image. The text of the first choice is returned.
    async fn describe(&self, image: &ImageSample) -> Result<String, AnalysisError>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions vision client
pub struct HttpVisionService {
    client: Client,
    url: Url,
    api_key: Option<String>,
    model: String,
    prompt: String,
}

impl HttpVisionService {
    pub fn new(config: &VisionConfig) -> Result<Self, AnalysisError> {
        let mut url = Url::parse(config.endpoint.trim_end_matches('/'))
            .map_err(|e| AnalysisError::Config(format!("Invalid endpoint '{}': {}", config.endpoint, e)))?;

        url.path_segments_mut()
            .map_err(|_| {
                AnalysisError::Config(format!("Endpoint '{}' cannot be used as a base URL", config.endpoint))
            })?
            .pop_if_empty()
            .extend(&["chat", "completions"]);

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AnalysisError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            prompt: config.prompt.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn request_body(&self, image: &ImageSample) -> serde_json::Value {
        let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(image.bytes()));
        json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": self.prompt },
                    { "type": "image_url", "image_url": { "url": data_url } },
                ],
            }],
        })
    }
}

/// First non-blank choice text
fn first_choice(response: CompletionResponse) -> Result<String, AnalysisError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(AnalysisError::EmptyResponse)
}

#[async_trait]
impl VisionService for HttpVisionService {
    async fn describe(&self, image: &ImageSample) -> Result<String, AnalysisError> {
        debug!("Sending {} byte image to {}", image.len(), self.url);

        let mut request = self.client.post(self.url.clone()).json(&self.request_body(image));
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        first_choice(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(endpoint: &str) -> HttpVisionService {
        HttpVisionService::new(&VisionConfig {
            endpoint: endpoint.to_string(),
            ..VisionConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            service("https://api.together.xyz/v1").url().as_str(),
            "https://api.together.xyz/v1/chat/completions"
        );
        assert_eq!(
            service("https://api.together.xyz/v1/").url().as_str(),
            "https://api.together.xyz/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_inlines_image() {
        let svc = service("https://api.together.xyz/v1");
        let body = svc.request_body(&ImageSample::new(vec![0xff, 0xd8, 0xff]));

        assert_eq!(body["model"], "google/gemma-3n-E4B-it");
        let content = &body["messages"][0]["content"];
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_first_choice() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "The path is clear for now."}}, {"message": {"content": "ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice(parsed).unwrap(), "The path is clear for now.");

        let parsed: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(first_choice(parsed), Err(AnalysisError::EmptyResponse)));

        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": "  "}}]}"#).unwrap();
        assert!(matches!(first_choice(parsed), Err(AnalysisError::EmptyResponse)));

        let parsed: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant"}}]}"#).unwrap();
        assert!(matches!(first_choice(parsed), Err(AnalysisError::EmptyResponse)));
    }

    #[test]
    fn test_invalid_endpoint() {
        let result = HttpVisionService::new(&VisionConfig {
            endpoint: "not a url".to_string(),
            ..VisionConfig::default()
        });
        assert!(matches!(result, Err(AnalysisError::Config(_))));
    }
}
