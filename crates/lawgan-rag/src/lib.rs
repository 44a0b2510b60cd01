//! Retrieval-augmented generation core: document loading, vector indexing,
//! and top-k semantic retrieval over heterogeneous legal sources.

pub mod document;
pub mod error;
pub mod in_memory_store;
pub mod index;
pub mod qdrant_store;
pub mod retriever;
pub mod vector_store;

pub use document::{Document, DocumentMetadata, SourceKind};
pub use error::RagError;
pub use in_memory_store::InMemoryVectorStore;
pub use index::DocumentIndex;
pub use qdrant_store::QdrantStore;
pub use retriever::Retriever;
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
