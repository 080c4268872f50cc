pub mod dto;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::Suggestion;

pub use ollama::{OllamaConfig, OllamaHttpClient};

/// One line-level item of a structured recognition reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredItem {
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
    #[serde(default)]
    pub structured: Vec<StructuredItem>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl RecognitionResult {
    /// Text handed to the schedule parser: structured items when the
    /// service produced any, the free text otherwise.
    pub fn source_text(&self) -> String {
        if self.structured.is_empty() {
            self.text.clone()
        } else {
            self.structured
                .iter()
                .map(|item| item.raw.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Image recognition backend.
///
/// `check_ready` fails with `ServiceUnavailable` or `ModelMissing`;
/// `recognize` fails with `RecognitionFailed`.
#[async_trait]
pub trait RecognitionClient: Send + Sync {
    async fn check_ready(&self) -> Result<(), AppError>;
    async fn recognize(&self, image: &[u8]) -> Result<RecognitionResult, AppError>;
}

pub struct NoopRecognitionClient;

#[async_trait]
impl RecognitionClient for NoopRecognitionClient {
    async fn check_ready(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn recognize(&self, _image: &[u8]) -> Result<RecognitionResult, AppError> {
        Ok(RecognitionResult::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_text_prefers_structured_items() {
        let result = RecognitionResult {
            text: "free text".to_string(),
            structured: vec![
                StructuredItem { raw: "CSE 143".to_string() },
                StructuredItem { raw: "10:30-11:20 MWF".to_string() },
            ],
            suggestions: Vec::new(),
        };
        assert_eq!(result.source_text(), "CSE 143\n10:30-11:20 MWF");
    }

    #[test]
    fn test_source_text_falls_back_to_text() {
        let result = RecognitionResult {
            text: "free text".to_string(),
            ..RecognitionResult::default()
        };
        assert_eq!(result.source_text(), "free text");
    }
}
