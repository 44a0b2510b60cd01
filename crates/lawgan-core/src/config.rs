use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use lawgan_llm::gemini::SafetySetting;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assistant: AssistantConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub name: String,
    pub top_k: u64,
}

/// Generation model settings. The API key is read from the env var named by
/// `api_key_env`, never from the file itself.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub safety: Vec<SafetySetting>,
}

/// Embedding model settings, independent of the generation provider so a
/// local Ollama embedder can back a hosted generation model.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub qdrant_url: String,
    pub collection: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SourcesConfig {
    pub reviews_csv: Option<PathBuf>,
    pub pdf_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LAWGAN_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Ok(v) = std::env::var("LAWGAN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("LAWGAN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LAWGAN_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("LAWGAN_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("LAWGAN_COLLECTION") {
            self.index.collection = v;
        }
        if let Ok(v) = std::env::var("LAWGAN_REVIEWS_CSV") {
            self.sources.reviews_csv = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("LAWGAN_PDF_DIR") {
            self.sources.pdf_dir = Some(PathBuf::from(v));
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            index: IndexConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Lawgan".into(),
            top_k: 5,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            base_url: "http://localhost:11434".into(),
            model: "gemini-2.0-flash".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            request_timeout_secs: 30,
            safety: default_safety(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            base_url: "http://localhost:11434".into(),
            model: "mxbai-embed-large".into(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".into(),
            collection: "legal_documents".into(),
        }
    }
}

fn default_safety() -> Vec<SafetySetting> {
    ["HARM_CATEGORY_DANGEROUS", "HARM_CATEGORY_HARASSMENT", "HARM_CATEGORY_HATE_SPEECH"]
        .into_iter()
        .map(|category| SafetySetting {
            category: category.to_owned(),
            threshold: "BLOCK_NONE".to_owned(),
        })
        .collect()
}
