//! Text-generation endpoint client (Gemini `generateContent` wire format).

use std::time::Duration;

use marksort_logging::{mark_debug, mark_warn};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::{OrganizeError, SetupError, TransportError};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const CONNECTION_TEST_PROMPT: &str = "Say \"OK\" and nothing else.";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct CategorizerSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub connect_timeout: Duration,
}

impl Default for CategorizerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// A single user turn carrying `text`.
    pub fn user_text(text: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: text.into() }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, empty when absent.
    pub fn first_text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Sends one prompt to a text-generation model and returns the reply text.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, OrganizeError>;
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    settings: CategorizerSettings,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(settings: CategorizerSettings) -> Result<Self, SetupError> {
        // No overall request timeout: model calls rely on transport defaults.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    /// The credential travels in a sensitive header and never in the url,
    /// so transport errors cannot echo it back.
    async fn post(
        &self,
        credential: &str,
        request: &GenerateContentRequest,
    ) -> Result<(reqwest::StatusCode, String), TransportError> {
        let mut key = HeaderValue::from_str(credential).map_err(|_| {
            TransportError::Network("credential is not a valid header value".to_string())
        })?;
        key.set_sensitive(true);
        let body = serde_json::to_vec(request)
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let response = self
            .client
            .post(self.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, key)
            .body(body)
            .send()
            .await
            .map_err(network_error)?;
        let status = response.status();
        let text = response.text().await.map_err(network_error)?;
        Ok((status, text))
    }

    /// Cheap round trip that confirms the credential is accepted.
    pub async fn test_connection(&self, credential: &str) -> Result<(), TransportError> {
        let request = GenerateContentRequest::user_text(
            CONNECTION_TEST_PROMPT,
            GenerationConfig {
                max_output_tokens: Some(10),
                ..GenerationConfig::default()
            },
        );
        let (status, body) = self.post(credential, &request).await?;
        if status.is_success() {
            return Ok(());
        }
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| format!("Error: {}", status.as_u16()));
        mark_warn!("Connection test rejected with {}: {}", status, message);
        Err(TransportError::Status {
            status: status.as_u16(),
            body: message,
        })
    }
}

fn network_error(err: reqwest::Error) -> TransportError {
    TransportError::Network(err.without_url().to_string())
}

#[async_trait::async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, OrganizeError> {
        let request = GenerateContentRequest::user_text(
            prompt,
            GenerationConfig {
                temperature: Some(self.settings.temperature),
                response_mime_type: Some("application/json".to_string()),
                max_output_tokens: None,
            },
        );
        mark_debug!(
            "generateContent model={} prompt_len={}",
            self.settings.model,
            prompt.len()
        );

        let (status, body) = self.post(credential, &request).await?;
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|err| OrganizeError::Schema(format!("endpoint returned invalid JSON: {err}")))?;
        Ok(parsed.first_text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_matches_wire_shape() {
        let request = GenerateContentRequest::user_text(
            "system\n\nuser",
            GenerationConfig {
                temperature: Some(0.3),
                response_mime_type: Some("application/json".to_string()),
                max_output_tokens: None,
            },
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "system\n\nuser" }] }],
                "generationConfig": { "temperature": 0.3, "responseMimeType": "application/json" }
            })
        );
    }

    #[test]
    fn first_text_defaults_to_empty() {
        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_text(), "");

        let no_parts: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert_eq!(no_parts.first_text(), "");

        let full: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"hi"},{"text":"x"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(full.first_text(), "hi");
    }
}
