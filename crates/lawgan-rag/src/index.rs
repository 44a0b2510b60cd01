use std::sync::Arc;

use uuid::Uuid;

use crate::document::{Document, SourceSet};
use crate::error::RagError;
use crate::vector_store::{VectorPoint, VectorStore};
use lawgan_llm::provider::EmbedFn;

/// Outcome of the startup ingestion decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The index was absent and has been built from the sources.
    Built(usize),
    /// A persisted index was found; ingestion was skipped.
    AlreadyPresent,
}

/// Owns the collection holding one embedding per ingested document.
///
/// The index is built at most once per persisted store: [`Self::ensure_built`]
/// is the only automatic build trigger, and a rebuild requires deleting the
/// collection out-of-band. Concurrent cold starts racing the existence check
/// are a known limitation; this type assumes a single ingestion owner.
pub struct DocumentIndex {
    store: Arc<dyn VectorStore>,
    collection: String,
    embed_fn: EmbedFn,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

impl DocumentIndex {
    pub fn new(
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        embed_fn: EmbedFn,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            embed_fn,
        }
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn VectorStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// True if a previously persisted index is present in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    pub async fn exists(&self) -> Result<bool, RagError> {
        Ok(self.store.collection_exists(&self.collection).await?)
    }

    /// Embed and upsert the full document set, all-or-nothing.
    ///
    /// Every document is embedded before any write happens; the collection is
    /// only created once the whole batch embedded successfully, and a failed
    /// upsert deletes it again so the existence check stays meaningful.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if any document fails to embed (no
    /// partial writes), [`RagError::DimensionMismatch`] if the provider
    /// returns vectors of varying width, or a store error.
    pub async fn build(&self, documents: &[Document]) -> Result<usize, RagError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let mut points = Vec::with_capacity(documents.len());
        let mut width: Option<usize> = None;
        for doc in documents {
            let vector = (self.embed_fn)(&doc.text).await?;
            match width {
                None => width = Some(vector.len()),
                Some(w) if w != vector.len() => {
                    return Err(RagError::DimensionMismatch {
                        indexed: w as u64,
                        active: vector.len() as u64,
                    });
                }
                Some(_) => {}
            }
            points.push(VectorPoint {
                id: point_id(&doc.id),
                vector,
                payload: doc.to_payload(),
            });
        }

        let count = points.len();
        let vector_size = width.unwrap_or_default() as u64;
        self.store
            .ensure_collection(&self.collection, vector_size)
            .await?;
        if let Err(e) = self.store.upsert(&self.collection, points).await {
            if let Err(del) = self.store.delete_collection(&self.collection).await {
                tracing::error!(
                    collection = %self.collection,
                    error = %del,
                    "failed to roll back collection after upsert error"
                );
            }
            return Err(e.into());
        }

        tracing::info!(collection = %self.collection, count, "document index built");
        Ok(count)
    }

    /// The startup ingestion decision: load sources and build only when no
    /// persisted index exists; otherwise verify the vector width eagerly and
    /// skip ingestion entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured source is unreadable, embedding or
    /// storage fails, or the persisted width no longer matches the provider.
    pub async fn ensure_built(&self, sources: &SourceSet) -> Result<BuildOutcome, RagError> {
        if self.exists().await? {
            self.verify_dimension().await?;
            tracing::info!(collection = %self.collection, "persisted index found, skipping ingestion");
            return Ok(BuildOutcome::AlreadyPresent);
        }
        let documents = sources.load_all().await?;
        let count = self.build(&documents).await?;
        Ok(BuildOutcome::Built(count))
    }

    /// Compare the persisted vector width against a probe embedding of the
    /// active provider. Stale vectors from a changed embedding model would
    /// otherwise stay silently queryable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] on width disagreement.
    pub async fn verify_dimension(&self) -> Result<(), RagError> {
        let Some(indexed) = self.store.vector_size(&self.collection).await? else {
            return Ok(());
        };
        let probe = (self.embed_fn)("dimension probe").await?;
        let active = probe.len() as u64;
        if indexed != active {
            return Err(RagError::DimensionMismatch { indexed, active });
        }
        Ok(())
    }
}

/// Deterministic point id for a document id, so re-ingestion upserts the same
/// point instead of duplicating it.
#[must_use]
pub fn point_id(doc_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::future::Future;
    use std::pin::Pin;

    use super::*;
    use crate::document::{DocumentMetadata, SourceKind};
    use crate::in_memory_store::InMemoryVectorStore;
    use crate::vector_store::{ScoredVectorPoint, VectorStoreError};

    fn make_doc(id: &str, text: &str) -> Document {
        Document {
            id: id.into(),
            text: text.into(),
            metadata: DocumentMetadata {
                source: SourceKind::Review,
                extra: BTreeMap::new(),
            },
        }
    }

    fn fixed_embed(width: usize) -> EmbedFn {
        Box::new(move |text: &str| {
            let mut v = vec![0.1f32; width];
            v[0] = text.len() as f32 / 100.0;
            Box::pin(async move { Ok(v) })
        })
    }

    fn failing_embed() -> EmbedFn {
        Box::new(|_text: &str| {
            Box::pin(async move { Err(lawgan_llm::LlmError::Other("mock embed error".into())) })
        })
    }

    #[tokio::test]
    async fn build_empty_is_noop() {
        let store = Arc::new(InMemoryVectorStore::new());
        let index = DocumentIndex::new(store.clone(), "legal", fixed_embed(4));
        assert_eq!(index.build(&[]).await.unwrap(), 0);
        assert!(!index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn build_creates_collection_and_counts() {
        let store = Arc::new(InMemoryVectorStore::new());
        let index = DocumentIndex::new(store.clone(), "legal", fixed_embed(4));
        let docs = vec![make_doc("csv_0", "Good place"), make_doc("csv_1", "Bad place")];
        assert_eq!(index.build(&docs).await.unwrap(), 2);
        assert!(index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn embedding_failure_leaves_no_index_behind() {
        let store = Arc::new(InMemoryVectorStore::new());
        let index = DocumentIndex::new(store.clone(), "legal", failing_embed());
        let result = index.build(&[make_doc("csv_0", "text")]).await;
        assert!(matches!(result, Err(RagError::Embedding(_))));
        assert!(!index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn inconsistent_embedding_width_is_rejected_before_writes() {
        let store = Arc::new(InMemoryVectorStore::new());
        let embed: EmbedFn = Box::new(|text: &str| {
            let width = if text.len() % 2 == 0 { 4 } else { 3 };
            Box::pin(async move { Ok(vec![0.5; width]) })
        });
        let index = DocumentIndex::new(store.clone(), "legal", embed);
        let docs = vec![make_doc("a", "even"), make_doc("b", "odd..")];
        let result = index.build(&docs).await;
        assert!(matches!(result, Err(RagError::DimensionMismatch { .. })));
        assert!(!index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn ensure_built_skips_when_index_present() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.ensure_collection("legal", 4).await.unwrap();

        // Sources pointing nowhere: must never be touched when skipping.
        let sources = SourceSet {
            reviews_csv: Some("/nonexistent/reviews.csv".into()),
            pdf_dir: None,
        };
        let index = DocumentIndex::new(store, "legal", fixed_embed(4));
        let outcome = index.ensure_built(&sources).await.unwrap();
        assert_eq!(outcome, BuildOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn ensure_built_builds_from_sources_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("reviews.csv");
        std::fs::write(
            &csv_path,
            "Title,Date,Rating,Review\nGood,2024-01-01,5,place\n",
        )
        .unwrap();

        let store = Arc::new(InMemoryVectorStore::new());
        let sources = SourceSet {
            reviews_csv: Some(csv_path),
            pdf_dir: None,
        };
        let index = DocumentIndex::new(store, "legal", fixed_embed(4));
        assert_eq!(
            index.ensure_built(&sources).await.unwrap(),
            BuildOutcome::Built(1)
        );
        assert!(index.exists().await.unwrap());
    }

    #[tokio::test]
    async fn stale_width_fails_eagerly() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.ensure_collection("legal", 8).await.unwrap();

        let index = DocumentIndex::new(store, "legal", fixed_embed(4));
        let result = index.ensure_built(&SourceSet::default()).await;
        assert!(matches!(
            result,
            Err(RagError::DimensionMismatch {
                indexed: 8,
                active: 4
            })
        ));
    }

    #[tokio::test]
    async fn rebuilding_upserts_same_points_without_duplicates() {
        let store = Arc::new(InMemoryVectorStore::new());
        let docs = vec![make_doc("csv_0", "Good place"), make_doc("csv_1", "Bad place")];

        let index = DocumentIndex::new(store.clone(), "legal", fixed_embed(4));
        index.build(&docs).await.unwrap();
        index.build(&docs).await.unwrap();

        let results = store
            .search("legal", vec![0.1, 0.1, 0.1, 0.1], 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn point_id_is_deterministic_per_doc_id() {
        assert_eq!(point_id("csv_0"), point_id("csv_0"));
        assert_ne!(point_id("csv_0"), point_id("csv_1"));
    }

    /// Store whose upserts always fail, for exercising the rollback path.
    struct BrokenUpsertStore {
        inner: InMemoryVectorStore,
    }

    type TestFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

    impl VectorStore for BrokenUpsertStore {
        fn ensure_collection(
            &self,
            collection: &str,
            vector_size: u64,
        ) -> TestFuture<'_, Result<(), VectorStoreError>> {
            self.inner.ensure_collection(collection, vector_size)
        }

        fn collection_exists(
            &self,
            collection: &str,
        ) -> TestFuture<'_, Result<bool, VectorStoreError>> {
            self.inner.collection_exists(collection)
        }

        fn delete_collection(
            &self,
            collection: &str,
        ) -> TestFuture<'_, Result<(), VectorStoreError>> {
            self.inner.delete_collection(collection)
        }

        fn vector_size(
            &self,
            collection: &str,
        ) -> TestFuture<'_, Result<Option<u64>, VectorStoreError>> {
            self.inner.vector_size(collection)
        }

        fn upsert(
            &self,
            _collection: &str,
            _points: Vec<VectorPoint>,
        ) -> TestFuture<'_, Result<(), VectorStoreError>> {
            Box::pin(async { Err(VectorStoreError::Upsert("disk full".into())) })
        }

        fn search(
            &self,
            collection: &str,
            vector: Vec<f32>,
            limit: u64,
        ) -> TestFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
            self.inner.search(collection, vector, limit)
        }
    }

    #[tokio::test]
    async fn failed_upsert_rolls_back_collection() {
        let store = Arc::new(BrokenUpsertStore {
            inner: InMemoryVectorStore::new(),
        });
        let index = DocumentIndex::new(store.clone(), "legal", fixed_embed(4));

        let result = index.build(&[make_doc("csv_0", "text")]).await;
        assert!(matches!(result, Err(RagError::Store(_))));
        assert!(!index.exists().await.unwrap());
    }
}
