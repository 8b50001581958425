//! Hosted-inference client: text generation, handwriting recognition and
//! canned quick-action requests.

pub mod inference_client;
pub mod payload;
pub mod presets;

pub use inference_client::{InferenceClient, PROBE_PROMPT};
pub use payload::{InferenceRequest, InferenceResponse, OcrOutcome};
pub use presets::QuickAction;
