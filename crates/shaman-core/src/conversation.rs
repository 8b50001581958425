//! Conversation transcript and the context string derived from it.
//!
//! The transcript is append-only apart from a full clear. The context string
//! is a window over its tail, rendered as alternating `User:` / `AI:` lines,
//! and is prefixed to the next conversational request.

use chrono::Local;
use serde::{Deserialize, Serialize};

const USER_LABEL: &str = "User:";
const ASSISTANT_LABEL: &str = "AI:";

/// One completed prompt/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
    /// Local time the exchange completed (RFC 3339).
    pub timestamp: String,
}

impl Exchange {
    fn render(&self) -> String {
        format!(
            "{USER_LABEL} {}\n{ASSISTANT_LABEL} {}\n",
            self.prompt, self.response
        )
    }
}

/// Transcript plus the running context window.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    exchanges: Vec<Exchange>,
    context: String,
    window: usize,
}

impl Conversation {
    /// Creates an empty conversation whose context covers the last `window` exchanges.
    pub fn new(window: usize) -> Self {
        Self {
            exchanges: Vec::new(),
            context: String::new(),
            window,
        }
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Current context prefix (empty when nothing has been exchanged).
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Frames a prompt as the next conversational turn, context first.
    pub fn frame(&self, input: &str) -> String {
        format!("{}{USER_LABEL} {input}\n{ASSISTANT_LABEL}", self.context)
    }

    /// Records a completed exchange and refreshes the context window.
    pub fn record(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.exchanges.push(Exchange {
            prompt: prompt.into(),
            response: response.into(),
            timestamp: Local::now().to_rfc3339(),
        });
        self.rebuild_context();
    }

    /// Clears both the transcript and the context.
    pub fn clear(&mut self) {
        self.exchanges.clear();
        self.context.clear();
    }

    /// Removes the injected framing from generated text.
    ///
    /// Models that ignore `return_full_text=false` echo the whole input back;
    /// that echo, or just the context part of it, is cut from the front.
    pub fn strip_injected(&self, framed_input: &str, generated: &str) -> String {
        let body = generated
            .strip_prefix(framed_input)
            .or_else(|| {
                if self.context.is_empty() {
                    None
                } else {
                    generated.strip_prefix(self.context.as_str())
                }
            })
            .unwrap_or(generated);

        let body = body.trim_start();
        let body = body.strip_prefix(ASSISTANT_LABEL).unwrap_or(body);
        body.trim().to_string()
    }

    fn rebuild_context(&mut self) {
        let start = self.exchanges.len().saturating_sub(self.window);
        self.context = self.exchanges[start..]
            .iter()
            .map(Exchange::render)
            .collect();
    }
}
