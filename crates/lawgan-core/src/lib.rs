//! Configuration and answer orchestration for the Lawgan legal assistant.

pub mod assistant;
pub mod config;
pub mod prompt;

pub use assistant::{Answer, AnswerError, Assistant};
pub use config::Config;
pub use prompt::build_prompt;
