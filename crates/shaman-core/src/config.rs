//! Client configuration.
//!
//! `ClientConfig` is passed explicitly to the inference client; nothing in the
//! workspace reads configuration from global state. Every field has a default
//! so a partial `config.toml` only overrides what it names.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::task::TaskHint;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co/models/";
pub const DEFAULT_CONVERSATIONAL_MODEL: &str = "microsoft/DialoGPT-medium";
pub const DEFAULT_QUANTITATIVE_MODEL: &str = "google/flan-t5-base";
pub const DEFAULT_OCR_MODEL: &str = "microsoft/trocr-base-handwritten";

/// Placeholder substituted with the user's prompt in a profile template.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Keywords that route a prompt to the quantitative profile.
pub const DEFAULT_MATH_KEYWORDS: &[&str] = &[
    "реши уравнение",
    "посчитай",
    "математика",
    "алгебра",
    "геометрия",
    "формула",
    "вычисли",
    "задача по математике",
    "уравнение",
    "график",
    "интеграл",
    "производная",
    "теорема",
];

/// Generation parameters sent verbatim as the `parameters` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub max_new_tokens: u32,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub do_sample: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_full_text: Option<bool>,
}

impl GenerationParameters {
    /// Parameters with only the two mandatory knobs set.
    pub fn basic(max_new_tokens: u32, temperature: f64) -> Self {
        Self {
            max_new_tokens,
            temperature,
            repetition_penalty: None,
            do_sample: None,
            return_full_text: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A model together with the prompt template and parameters used to call it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub model_id: String,
    /// Template containing `{prompt}`. A template without the placeholder
    /// gets the prompt appended after a space.
    #[serde(default = "default_template")]
    pub prompt_template: String,
    pub parameters: GenerationParameters,
}

impl ModelProfile {
    /// Applies the template to a prompt.
    pub fn render(&self, prompt: &str) -> String {
        if self.prompt_template.contains(PROMPT_PLACEHOLDER) {
            self.prompt_template.replace(PROMPT_PLACEHOLDER, prompt)
        } else if self.prompt_template.trim().is_empty() {
            prompt.to_string()
        } else {
            format!("{} {}", self.prompt_template.trim_end(), prompt)
        }
    }

    pub fn conversational_default() -> Self {
        Self {
            model_id: DEFAULT_CONVERSATIONAL_MODEL.to_string(),
            prompt_template: default_template(),
            parameters: GenerationParameters {
                max_new_tokens: 150,
                temperature: 0.7,
                repetition_penalty: Some(1.1),
                do_sample: Some(true),
                return_full_text: Some(false),
            },
        }
    }

    pub fn quantitative_default() -> Self {
        Self {
            model_id: DEFAULT_QUANTITATIVE_MODEL.to_string(),
            prompt_template: "Реши математическую задачу: {prompt}".to_string(),
            parameters: GenerationParameters::basic(200, 0.3),
        }
    }
}

fn default_template() -> String {
    PROMPT_PLACEHOLDER.to_string()
}

/// Configuration for `InferenceClient`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint prefix; the model id is appended verbatim.
    pub base_url: String,
    pub ocr_model: String,
    pub math_keywords: Vec<String>,
    /// Number of most recent exchanges folded into the context string.
    /// Zero disables context threading.
    pub max_context_exchanges: usize,
    /// Delay reported with `ModelWarmingUp` when the server gives no estimate.
    pub warmup_retry_secs: u64,
    /// Overall request timeout. Unset keeps the transport default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    pub conversational: ModelProfile,
    pub quantitative: ModelProfile,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            math_keywords: DEFAULT_MATH_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            max_context_exchanges: 5,
            warmup_retry_secs: 20,
            request_timeout_secs: None,
            conversational: ModelProfile::conversational_default(),
            quantitative: ModelProfile::quantitative_default(),
        }
    }
}

impl ClientConfig {
    /// Returns the profile selected by a task hint.
    pub fn profile(&self, hint: TaskHint) -> &ModelProfile {
        match hint {
            TaskHint::Conversational => &self.conversational,
            TaskHint::Quantitative => &self.quantitative,
        }
    }

    /// Full endpoint URL for a model id.
    pub fn endpoint(&self, model_id: &str) -> String {
        format!("{}{}", self.base_url, model_id)
    }

    pub fn warmup_retry_delay(&self) -> Duration {
        Duration::from_secs(self.warmup_retry_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
