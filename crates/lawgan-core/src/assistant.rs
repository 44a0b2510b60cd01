use lawgan_llm::error::LlmError;
use lawgan_llm::provider::{LlmProvider, Message};
use lawgan_rag::{RagError, Retriever};

use crate::prompt::build_prompt;

#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("invalid question: expected a non-empty string")]
    EmptyQuestion,

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RagError),

    #[error("generation failed: {0}")]
    Generation(String),
}

/// Tagged outcome of one answer request, instead of the error-string-in-band
/// signaling the message flow used to rely on. Callers that persist a message
/// either way can still render a failure via [`Answer::into_text`].
#[derive(Debug)]
pub enum Answer {
    Reply(String),
    Failed(AnswerError),
}

impl Answer {
    #[must_use]
    pub fn is_reply(&self) -> bool {
        matches!(self, Self::Reply(_))
    }

    /// Render the outcome as the message text to persist; failures become an
    /// `Error: ...` string rather than a crash.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Reply(text) => text,
            Self::Failed(e) => format!("Error: {e}"),
        }
    }
}

/// End-to-end question answering: retrieve, assemble the grounded prompt,
/// generate. Holds the generation provider and a retriever over the built
/// index; safe to share across concurrent requests.
pub struct Assistant<P: LlmProvider> {
    provider: P,
    retriever: Retriever,
}

impl<P: LlmProvider> std::fmt::Debug for Assistant<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("provider", &self.provider.name())
            .field("retriever", &self.retriever)
            .finish()
    }
}

impl<P: LlmProvider> Assistant<P> {
    pub fn new(provider: P, retriever: Retriever) -> Self {
        Self {
            provider,
            retriever,
        }
    }

    /// Answer a legal question. Never panics or propagates an error past this
    /// boundary: every failure mode is folded into [`Answer::Failed`].
    pub async fn answer(&self, question: &str) -> Answer {
        let question = question.trim();
        if question.is_empty() {
            return Answer::Failed(AnswerError::EmptyQuestion);
        }

        let documents = match self.retriever.retrieve_default(question).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed");
                return Answer::Failed(e.into());
            }
        };

        let prompt = build_prompt(question, &documents);
        match self.generate(&prompt).await {
            Ok(text) => Answer::Reply(text),
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "generation failed");
                Answer::Failed(AnswerError::Generation(e.to_string()))
            }
        }
    }

    /// One generation call. An empty trimmed response counts as a failure.
    ///
    /// # Errors
    ///
    /// Returns the provider error, or [`LlmError::EmptyResponse`] for blank output.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.provider.chat(&[Message::user(prompt)]).await?;
        let trimmed = response.trim();
        if trimmed.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.provider.name().to_owned(),
            });
        }
        Ok(trimmed.to_owned())
    }

    /// Summarize a message into a short session title (3-5 words, title case,
    /// no trailing punctuation).
    ///
    /// # Errors
    ///
    /// Returns an error if the provider call fails.
    pub async fn session_title(&self, text: &str) -> Result<String, LlmError> {
        let instruction = format!(
            "Convert this text into a clear, concise title (3-5 words): '{text}'. \
             Follow these rules: \
             1. Use title case \
             2. No ending punctuation \
             3. Focus on main keywords \
             4. Keep it descriptive but short \
             5. Should be a summarized meaningful title"
        );
        let raw = self.provider.chat(&[Message::user(instruction)]).await?;
        Ok(normalize_title(&raw))
    }
}

fn normalize_title(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .replace('\n', " ")
        .trim()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lawgan_llm::mock::MockProvider;
    use lawgan_llm::provider::EmbedFn;
    use lawgan_rag::{InMemoryVectorStore, Retriever, VectorStore};

    use super::*;

    fn unit_embed() -> EmbedFn {
        Box::new(|_text: &str| Box::pin(async { Ok(vec![1.0, 0.0]) }))
    }

    async fn built_retriever() -> Retriever {
        let store = Arc::new(InMemoryVectorStore::new());
        store.ensure_collection("legal", 2).await.unwrap();
        Retriever::new(store, "legal", unit_embed())
    }

    #[tokio::test]
    async fn empty_question_is_invalid_input() {
        let assistant = Assistant::new(MockProvider::default(), built_retriever().await);
        let answer = assistant.answer("   ").await;
        assert!(matches!(answer, Answer::Failed(AnswerError::EmptyQuestion)));
    }

    #[tokio::test]
    async fn failed_answer_renders_with_error_prefix() {
        let assistant = Assistant::new(MockProvider::failing(), built_retriever().await);
        let answer = assistant.answer("What is due process?").await;
        assert!(!answer.is_reply());
        let text = answer.into_text();
        assert!(text.starts_with("Error: "));
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn successful_answer_is_trimmed_reply() {
        let provider = MockProvider::with_responses(vec!["  Due process means...  \n".into()]);
        let assistant = Assistant::new(provider, built_retriever().await);
        let answer = assistant.answer("What is due process?").await;
        assert!(answer.is_reply());
        assert_eq!(answer.into_text(), "Due process means...");
    }

    #[tokio::test]
    async fn blank_model_output_is_a_generation_failure() {
        let provider = MockProvider::with_responses(vec!["   ".into()]);
        let assistant = Assistant::new(provider, built_retriever().await);
        let answer = assistant.answer("question").await;
        assert!(matches!(
            answer,
            Answer::Failed(AnswerError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn retrieval_failure_is_contained() {
        // Retriever pointed at a collection that was never created.
        let store = Arc::new(InMemoryVectorStore::new());
        let retriever = Retriever::new(store, "absent", unit_embed());
        let assistant = Assistant::new(MockProvider::default(), retriever);

        let answer = assistant.answer("question").await;
        assert!(matches!(answer, Answer::Failed(AnswerError::Retrieval(_))));
        assert!(answer.into_text().starts_with("Error: "));
    }

    #[tokio::test]
    async fn answer_is_non_empty_for_any_non_empty_question() {
        for question in ["a", "what?", "Explain Article 12 of the constitution"] {
            let assistant = Assistant::new(MockProvider::default(), built_retriever().await);
            let text = assistant.answer(question).await.into_text();
            assert!(!text.is_empty());
        }
    }

    #[tokio::test]
    async fn session_title_strips_quotes_and_newlines() {
        let provider = MockProvider::with_responses(vec!["\"Addition of\nTwo Numbers\"".into()]);
        let assistant = Assistant::new(provider, built_retriever().await);
        let title = assistant.session_title("write a program to add 2 numbers").await.unwrap();
        assert_eq!(title, "Addition of Two Numbers");
    }

    #[tokio::test]
    async fn session_title_propagates_provider_errors() {
        let assistant = Assistant::new(MockProvider::failing(), built_retriever().await);
        assert!(assistant.session_title("text").await.is_err());
    }

    #[test]
    fn normalize_title_handles_plain_text() {
        assert_eq!(normalize_title("  Simple Title  "), "Simple Title");
        assert_eq!(normalize_title("'Quoted'"), "Quoted");
    }
}
