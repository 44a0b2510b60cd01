use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};
use crate::retry::send_with_retry;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MAX_RETRIES: u32 = 3;

/// One Gemini content-filter rule, e.g. `HARM_CATEGORY_HARASSMENT` / `BLOCK_NONE`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: Option<String>,
    safety_settings: Vec<SafetySetting>,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("safety_settings", &self.safety_settings)
            .finish_non_exhaustive()
    }
}

impl Clone for GeminiProvider {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            embedding_model: self.embedding_model.clone(),
            safety_settings: self.safety_settings.clone(),
        }
    }
}

impl GeminiProvider {
    /// Create a provider for the Generative Language API.
    ///
    /// `timeout` bounds every generation and embedding call; a timed-out
    /// request surfaces as an HTTP error, not a hang.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        api_key: String,
        model: String,
        safety_settings: Vec<SafetySetting>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key,
            model,
            embedding_model: None,
            safety_settings,
        })
    }

    #[must_use]
    pub fn with_embedding_model(mut self, model: String) -> Self {
        self.embedding_model = Some(model);
        self
    }

    /// Override the API endpoint, primarily for tests against a local server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }

    fn embed_url(&self, embedding_model: &str) -> String {
        format!(
            "{}/models/{}:embedContent?key={}",
            self.base_url, embedding_model, self.api_key
        )
    }
}

impl LlmProvider for GeminiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = build_request_body(messages, &self.safety_settings);
        let url = self.generate_url();

        let response = send_with_retry("gemini", MAX_RETRIES, || {
            self.client.post(&url).json(&body).send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Other(format!(
                "Gemini request failed with status {status}: {text}"
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.into_text();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: "gemini".into(),
            });
        }
        Ok(text)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(embedding_model) = &self.embedding_model else {
            return Err(LlmError::EmbedUnsupported {
                provider: "gemini".into(),
            });
        };

        let body = EmbedContentRequest {
            content: Content {
                role: None,
                parts: vec![Part {
                    text: text.to_owned(),
                }],
            },
        };
        let url = self.embed_url(embedding_model);

        let response = send_with_retry("gemini", MAX_RETRIES, || {
            self.client.post(&url).json(&body).send()
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Other(format!(
                "Gemini embedding failed with status {status}: {text}"
            )));
        }

        let parsed: EmbedContentResponse = response.json().await?;
        if parsed.embedding.values.is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: "gemini".into(),
            });
        }
        Ok(parsed.embedding.values)
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "gemini"
    }
}

fn build_request_body(
    messages: &[Message],
    safety_settings: &[SafetySetting],
) -> GenerateContentRequest {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => system_parts.push(Part {
                text: msg.content.clone(),
            }),
            Role::User | Role::Assistant => contents.push(Content {
                role: Some(match msg.role {
                    Role::User => "user".to_owned(),
                    _ => "model".to_owned(),
                }),
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            }),
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(Content {
            role: None,
            parts: system_parts,
        })
    };

    GenerateContentRequest {
        contents,
        system_instruction,
        safety_settings: safety_settings.to_vec(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
