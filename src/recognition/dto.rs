use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Entries of `/api/tags`; older servers list bare names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Named { name: String },
    Plain(String),
    Other(serde_json::Value),
}

impl ModelEntry {
    pub fn name(&self) -> Option<&str> {
        match self {
            ModelEntry::Named { name } => Some(name),
            ModelEntry::Plain(name) => Some(name),
            ModelEntry::Other(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub images: Vec<String>,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}
