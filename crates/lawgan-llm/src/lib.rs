//! LLM provider abstraction and backend implementations.

pub mod any;
pub mod error;
pub mod gemini;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;
mod retry;

pub use error::LlmError;
pub use provider::LlmProvider;
