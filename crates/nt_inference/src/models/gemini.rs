use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nt_core::{Error, GenerationOptions, ResponseFormat, Result, TextGenerator};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiModel {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiModel {
    pub fn new(api_key: Option<String>, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is required".to_string()))?;

        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL);
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid Gemini base URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            api_key,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model_id: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model_id)
    }
}

#[async_trait]
impl TextGenerator for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let generation_config = match (options.response_format, options.response_schema) {
            (ResponseFormat::Text, None) => None,
            (format, schema) => Some(GenerationConfig {
                response_mime_type: format.mime_type(),
                response_schema: schema.map(|s| s.json_schema()),
            }),
        };

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config,
        };

        let response = self
            .client
            .post(self.endpoint(model_id))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body = response.json::<GenerateResponse>().await?;
        if body.candidates.is_empty() {
            if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(Error::Service(format!("Prompt blocked: {}", reason)));
            }
        }

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        tracing::debug!(model = model_id, response_chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.status),
        Err(_) => body.trim().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Transport(format!("Authentication failed ({}): {}", status.as_u16(), message))
        }
        _ => Error::Service(format!("{}: {}", status.as_u16(), message)),
    }
}
