use std::env;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::{RecognitionClient, RecognitionResult, dto};
use crate::error::AppError;
use crate::models::Suggestion;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llava";

const SCHEDULE_PROMPT: &str = "\
Read the class schedule in this image and answer with a JSON array only. \
Use one object per class meeting with exactly these string fields:
- course: department and course number, for example \"CSE 143\"
- title: the course title
- days: meeting days as letters, for example \"MWF\" or \"TR\"
- time: the meeting time, for example \"10:30-11:20\"
- location: building and room
Do not add other fields and do not wrap the array in prose.";

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

impl OllamaConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string());
        let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());

        if base_url.trim().is_empty() {
            return Err(AppError::Config("OLLAMA_URL is empty".to_string()));
        }
        if model.trim().is_empty() {
            return Err(AppError::Config("OLLAMA_MODEL is empty".to_string()));
        }

        Ok(Self {
            base_url: base_url.trim().to_string(),
            model: model.trim().to_string(),
        })
    }
}

pub struct OllamaHttpClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaHttpClient {
    pub fn new(config: OllamaConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl RecognitionClient for OllamaHttpClient {
    async fn check_ready(&self) -> Result<(), AppError> {
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| {
                warn!("Ollama readiness check failed: {}", e);
                AppError::ServiceUnavailable(
                    "Could not connect to Ollama. Please make sure Ollama is running (ollama serve)"
                        .to_string(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ServiceUnavailable(format!(
                "Invalid response from Ollama server: {} {}",
                status, body
            )));
        }

        let tags: dto::TagsResponse = response.json().await.map_err(|e| {
            AppError::ServiceUnavailable(format!("Invalid response from Ollama server: {}", e))
        })?;

        let names: Vec<&str> = tags.models.iter().filter_map(dto::ModelEntry::name).collect();
        debug!("Ollama models available: {:?}", names);

        let wanted = self.config.model.to_lowercase();
        if names.iter().any(|name| name.to_lowercase().contains(&wanted)) {
            info!("Ollama is ready with model {}", self.config.model);
            Ok(())
        } else {
            Err(AppError::ModelMissing(format!(
                "{} model not found. Please run: ollama pull {}",
                self.config.model, self.config.model
            )))
        }
    }

    async fn recognize(&self, image: &[u8]) -> Result<RecognitionResult, AppError> {
        let request_body = dto::GenerateRequest {
            model: &self.config.model,
            prompt: SCHEDULE_PROMPT,
            images: vec![base64::engine::general_purpose::STANDARD.encode(image)],
            stream: false,
        };

        info!("Sending {} byte image to {}", image.len(), self.config.model);

        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::RecognitionFailed(format!("Request to Ollama failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RecognitionFailed(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| AppError::RecognitionFailed(format!("Failed to read Ollama response: {}", e)))?;

        let envelope: dto::GenerateResponse = serde_json::from_str(&body_text).map_err(|e| {
            tracing::error!("Failed to parse: {}", e);
            AppError::RecognitionFailed(format!("Failed to parse Ollama response: {}", e))
        })?;

        let suggestions = parse_suggestions(&envelope.response);
        info!("Recognition returned {} suggestions", suggestions.len());

        Ok(RecognitionResult {
            text: envelope.response,
            structured: Vec::new(),
            suggestions,
        })
    }
}

/// Reads the model reply as a JSON array of suggestions, also accepting an
/// array wrapped in prose or code fences. Anything else yields no suggestions.
pub fn parse_suggestions(reply: &str) -> Vec<Suggestion> {
    if let Ok(list) = serde_json::from_str::<Vec<Suggestion>>(reply.trim()) {
        return list;
    }

    if let (Some(start), Some(end)) = (reply.find('['), reply.rfind(']')) {
        if start < end {
            if let Ok(list) = serde_json::from_str::<Vec<Suggestion>>(&reply[start..=end]) {
                return list;
            }
        }
    }

    warn!("Failed to parse JSON response: {}", reply);
    Vec::new()
}
