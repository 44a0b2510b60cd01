use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Boxed future returned by embedding closures, for dyn-safe consumers.
pub type EmbedFuture = Pin<Box<dyn Future<Output = Result<Vec<f32>, LlmError>> + Send>>;

/// Type-erased embedding function handed to the index and retriever.
pub type EmbedFn = Box<dyn Fn(&str) -> EmbedFuture + Send + Sync>;

pub trait LlmProvider: Send + Sync {
    /// Send messages to the LLM and return the assistant response.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message])
    -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Map a text string to a fixed-dimension embedding vector.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::EmbedUnsupported`] unless the backend overrides this.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send {
        let _ = text;
        let provider = self.name().to_owned();
        async move { Err(LlmError::EmbedUnsupported { provider }) }
    }

    fn supports_embeddings(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ChatOnly;

    impl LlmProvider for ChatOnly {
        async fn chat(&self, _messages: &[Message]) -> Result<String, LlmError> {
            Ok("ok".into())
        }

        #[allow(clippy::unnecessary_literal_bound)]
        fn name(&self) -> &str {
            "chat-only"
        }
    }

    #[tokio::test]
    async fn embed_unsupported_by_default() {
        let result = ChatOnly.embed("text").await;
        assert!(matches!(
            result,
            Err(LlmError::EmbedUnsupported { provider }) if provider == "chat-only"
        ));
        assert!(!ChatOnly.supports_embeddings());
    }

    #[test]
    fn message_constructors_set_roles() {
        assert_eq!(Message::system("s").role, Role::System);
        assert_eq!(Message::user("u").role, Role::User);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    }
}
