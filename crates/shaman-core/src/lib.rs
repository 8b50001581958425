//! Domain types shared by every Shaman crate: configuration, prompt
//! classification, the conversation transcript, credentials and errors.

pub mod config;
pub mod conversation;
pub mod credential;
pub mod error;
pub mod task;

pub use config::{ClientConfig, GenerationParameters, ModelProfile};
pub use conversation::{Conversation, Exchange};
pub use credential::{Credential, CredentialSource};
pub use error::{Result, ShamanError};
pub use task::{GenerationMode, TaskHint};
