//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    pub embedding: Vec<f32>,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: vec![0.0; 8],
            supports_embeddings: false,
            fail_chat: false,
            fail_embed: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            supports_embeddings: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_failing_embed() -> Self {
        Self {
            supports_embeddings: true,
            fail_embed: true,
            ..Self::default()
        }
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, _messages: &[Message]) -> Result<String, LlmError> {
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        if self.fail_embed {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok(self.embedding.clone())
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_responses_in_order() {
        let mock = MockProvider::with_responses(vec!["one".into(), "two".into()]);
        assert_eq!(mock.chat(&[]).await.unwrap(), "one");
        assert_eq!(mock.chat(&[]).await.unwrap(), "two");
        assert_eq!(mock.chat(&[]).await.unwrap(), "mock response");
    }

    #[tokio::test]
    async fn failing_mock_errors() {
        let mock = MockProvider::failing();
        assert!(mock.chat(&[]).await.is_err());
    }

    #[tokio::test]
    async fn embedding_returned_as_configured() {
        let mock = MockProvider::with_embedding(vec![1.0, 2.0]);
        assert!(mock.supports_embeddings());
        assert_eq!(mock.embed("any").await.unwrap(), vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn failing_embed_errors() {
        let mock = MockProvider::with_failing_embed();
        assert!(mock.embed("any").await.is_err());
    }
}
