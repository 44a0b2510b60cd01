use std::sync::Arc;

use crate::document::Document;
use crate::error::RagError;
use crate::vector_store::VectorStore;
use lawgan_llm::provider::EmbedFn;

pub const DEFAULT_TOP_K: u64 = 5;

/// Embeds a question and returns the top-k nearest documents from the index.
///
/// Similarity scores stay internal; callers receive documents already ranked
/// most-relevant first. Every call re-embeds and re-searches, the index being
/// read-only at query time.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    collection: String,
    embed_fn: EmbedFn,
    top_k: u64,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("collection", &self.collection)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    pub fn new(
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        embed_fn: EmbedFn,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            embed_fn,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve with the configured default k.
    ///
    /// # Errors
    ///
    /// Returns an error if query embedding or the store search fails.
    pub async fn retrieve_default(&self, question: &str) -> Result<Vec<Document>, RagError> {
        self.retrieve(question, self.top_k).await
    }

    /// Retrieve up to `k` documents ranked by descending similarity to the
    /// embedded question. `k = 0` short-circuits to an empty result.
    ///
    /// # Errors
    ///
    /// Returns an error if query embedding or the store search fails.
    pub async fn retrieve(&self, question: &str, k: u64) -> Result<Vec<Document>, RagError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = (self.embed_fn)(question).await?;
        let results = self.store.search(&self.collection, vector, k).await?;
        tracing::debug!(count = results.len(), k, "retrieved documents");

        Ok(results
            .into_iter()
            .filter_map(|point| Document::from_payload(point.payload))
            .collect())
    }
}
