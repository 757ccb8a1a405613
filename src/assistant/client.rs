//! AI query backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::AI_MODEL;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("Gemini API key is not configured.")]
    MissingCredential,
    #[error("Sorry, I encountered an error.")]
    Request(String),
}

/// Answers a question about a document.
pub trait AiClient: Send + Sync {
    /// Whether a credential is available; unconfigured clients are never asked.
    fn is_configured(&self) -> bool;
    /// Blocking call, run off the main thread.
    fn ask(&self, document_text: &str, utterance: &str) -> Result<String, AiError>;
}

pub fn system_instruction(document_text: &str) -> String {
    format!(
        "You are a helpful assistant for analyzing documents. The user has provided the \
         following document content. Keep your answers concise and conversational. \
         Document content: \"\"\"{}\"\"\"",
        document_text
    )
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini `generateContent` over HTTPS.
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: AI_MODEL.to_string(),
        }
    }

    /// Key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Self {
        let key = std::env::var("GEMINI_API_KEY")
            .ok()
            .or_else(|| std::env::var("API_KEY").ok());
        Self::new(key)
    }
}

impl AiClient for GeminiClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn ask(&self, document_text: &str, utterance: &str) -> Result<String, AiError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(AiError::MissingCredential);
        };

        let instruction = system_instruction(document_text);
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: utterance }],
            }],
        };

        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let response = ureq::post(&url)
            .set("x-goog-api-key", key)
            .set("User-Agent", "docpresenter")
            .send_json(&request)
            .map_err(|e| AiError::Request(e.to_string()))?;

        let body: GenerateResponse = response
            .into_json()
            .map_err(|e| AiError::Request(format!("invalid response: {}", e)))?;
        body.text()
            .ok_or_else(|| AiError::Request("empty response".to_string()))
    }
}
