//! Prompt classification and generation mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which model profile a prompt is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskHint {
    /// Free-form chat; threads the conversation context.
    Conversational,
    /// Math questions; stateless.
    Quantitative,
}

impl TaskHint {
    /// Classifies a prompt by case-insensitive substring match against `keywords`.
    ///
    /// Any single hit selects `Quantitative`. Empty keywords never match.
    pub fn classify<S: AsRef<str>>(prompt: &str, keywords: &[S]) -> Self {
        let lowered = prompt.to_lowercase();
        let is_math = keywords.iter().any(|keyword| {
            let keyword = keyword.as_ref().trim();
            !keyword.is_empty() && lowered.contains(&keyword.to_lowercase())
        });

        if is_math {
            TaskHint::Quantitative
        } else {
            TaskHint::Conversational
        }
    }
}

impl fmt::Display for TaskHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskHint::Conversational => write!(f, "conversational"),
            TaskHint::Quantitative => write!(f, "quantitative"),
        }
    }
}

/// User-selectable creativity level for conversational requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Creative answers.
    #[default]
    Smart,
    /// Precise answers.
    Fast,
}

impl GenerationMode {
    /// Temperature forced onto conversational requests. `Smart` keeps the
    /// profile's own temperature.
    pub fn temperature_override(self) -> Option<f64> {
        match self {
            GenerationMode::Smart => None,
            GenerationMode::Fast => Some(0.3),
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Smart => write!(f, "smart"),
            GenerationMode::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for GenerationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smart" => Ok(GenerationMode::Smart),
            "fast" => Ok(GenerationMode::Fast),
            other => Err(format!("Unknown mode '{other}', expected 'smart' or 'fast'")),
        }
    }
}
