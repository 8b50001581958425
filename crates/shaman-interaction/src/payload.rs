//! Wire types for the hosted-inference API.
//!
//! Inference responses arrive in several shapes depending on the model
//! family. They are decoded into [`InferenceResponse`] by trying each known
//! shape in turn; a body that matches none is `UnrecognizedResponseShape`.

use serde::{Deserialize, Serialize};
use shaman_core::{GenerationParameters, Result, ShamanError};
use std::time::Duration;

/// Longest body excerpt carried in error messages.
const BODY_EXCERPT_LEN: usize = 200;

/// Body of `POST {base_url}{model_id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    pub inputs: String,
    pub parameters: GenerationParameters,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Generation {
    pub generated_text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Summary {
    pub summary_text: String,
}

/// The response shapes the inference endpoint is known to return.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    /// `[{"generated_text": ...}, ...]`
    Generations(Vec<Generation>),
    /// `{"generated_text": ...}`
    Generation(Generation),
    /// `[{"summary_text": ...}, ...]`
    Summaries(Vec<Summary>),
    /// `"..."`
    Text(String),
}

impl InferenceResponse {
    /// Decodes a raw body into one of the known shapes.
    pub fn decode(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|_| ShamanError::UnrecognizedResponseShape(excerpt(body)))
    }

    /// Extracts the text; arrays yield their first element.
    pub fn into_text(self) -> Result<String> {
        let text = match self {
            InferenceResponse::Generations(generations) => {
                generations.into_iter().next().map(|g| g.generated_text)
            }
            InferenceResponse::Generation(generation) => Some(generation.generated_text),
            InferenceResponse::Summaries(summaries) => {
                summaries.into_iter().next().map(|s| s.summary_text)
            }
            InferenceResponse::Text(text) => Some(text),
        };

        text.ok_or_else(|| ShamanError::UnrecognizedResponseShape("empty array".to_string()))
    }
}

/// Result of a handwriting recognition call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    Recognized(String),
    /// The service answered but found no text. Not an error.
    NotRecognized,
}

impl OcrOutcome {
    /// Decodes `{"text": ...}`. A missing, null or blank `text` is `NotRecognized`.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|_| ShamanError::UnrecognizedResponseShape(excerpt(body)))?;

        let object = value
            .as_object()
            .ok_or_else(|| ShamanError::UnrecognizedResponseShape(excerpt(body)))?;

        match object.get("text").and_then(|text| text.as_str()) {
            Some(text) if !text.trim().is_empty() => Ok(OcrOutcome::Recognized(text.to_string())),
            _ => Ok(OcrOutcome::NotRecognized),
        }
    }
}

/// Error body: `{"error": "..." | ["..."], "estimated_time": 20.0}`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    estimated_time: Option<f64>,
}

impl ErrorBody {
    pub(crate) fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Human readable message, falling back to the raw body.
    pub(crate) fn message_or(&self, body: &str) -> String {
        match &self.error {
            Some(serde_json::Value::String(message)) => message.clone(),
            Some(serde_json::Value::Array(messages)) => messages
                .iter()
                .filter_map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ if body.trim().is_empty() => "empty response body".to_string(),
            _ => excerpt(body.as_bytes()),
        }
    }

    /// Server estimate of how long the model needs to load.
    pub(crate) fn estimated_wait(&self) -> Option<Duration> {
        self.estimated_time
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() <= BODY_EXCERPT_LEN {
        text.into_owned()
    } else {
        let cut: String = text.chars().take(BODY_EXCERPT_LEN).collect();
        format!("{cut}...")
    }
}
