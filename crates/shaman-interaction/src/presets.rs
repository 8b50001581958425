//! Quick actions: canned requests that bypass the conversation.
//!
//! Each action carries its own prompt and generation parameters and is
//! served by the model of its task hint.

use shaman_core::{ClientConfig, GenerationParameters, TaskHint};
use std::fmt;
use std::str::FromStr;

use crate::payload::InferenceRequest;

/// Canned requests offered next to free-form chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    /// Worked quadratic equation.
    ExampleMath,
    /// Heron's formula on a 5-6-7 triangle.
    ExampleGeometry,
    /// Newton's laws for school students.
    Physics,
    /// Basics of chemical reactions for school students.
    Chemistry,
}

impl QuickAction {
    pub const ALL: [QuickAction; 4] = [
        QuickAction::ExampleMath,
        QuickAction::ExampleGeometry,
        QuickAction::Physics,
        QuickAction::Chemistry,
    ];

    /// The question shown to the user as if they had typed it.
    pub fn seed_prompt(self) -> &'static str {
        match self {
            QuickAction::ExampleMath => "Решите уравнение: x² - 5x + 6 = 0",
            QuickAction::ExampleGeometry => "Найдите площадь треугольника со сторонами 5, 6, 7",
            QuickAction::Physics => "🔬 Задайте вопрос по физике...",
            QuickAction::Chemistry => "🧪 Задайте вопрос по химии...",
        }
    }

    /// Profile whose model serves this action.
    pub fn task_hint(self) -> TaskHint {
        match self {
            QuickAction::ExampleMath => TaskHint::Quantitative,
            _ => TaskHint::Conversational,
        }
    }

    fn inputs(self) -> String {
        match self {
            QuickAction::ExampleMath => format!(
                "Реши математическую задачу: {} Объясни шаги решения подробно.",
                self.seed_prompt()
            ),
            QuickAction::ExampleGeometry => format!(
                "Реши геометрическую задачу: {} Объясни решение по формуле Герона.",
                self.seed_prompt()
            ),
            QuickAction::Physics => {
                "Объясни концепцию из физики для школьников: законы Ньютона".to_string()
            }
            QuickAction::Chemistry => "Объясни основы химических реакций для школьников".to_string(),
        }
    }

    fn parameters(self) -> GenerationParameters {
        match self {
            QuickAction::ExampleMath => GenerationParameters::basic(200, 0.3),
            QuickAction::ExampleGeometry => GenerationParameters::basic(200, 0.7),
            QuickAction::Physics | QuickAction::Chemistry => GenerationParameters::basic(150, 0.7),
        }
    }

    /// Model id and request body for this action under `config`.
    pub fn request(self, config: &ClientConfig) -> (String, InferenceRequest) {
        let model_id = config.profile(self.task_hint()).model_id.clone();
        let request = InferenceRequest {
            inputs: self.inputs(),
            parameters: self.parameters(),
        };
        (model_id, request)
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuickAction::ExampleMath => "math",
            QuickAction::ExampleGeometry => "geometry",
            QuickAction::Physics => "physics",
            QuickAction::Chemistry => "chemistry",
        };
        write!(f, "{name}")
    }
}

impl FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        QuickAction::ALL
            .into_iter()
            .find(|action| action.to_string() == wanted)
            .ok_or_else(|| {
                format!("Unknown quick action '{wanted}', expected math, geometry, physics or chemistry")
            })
    }
}
