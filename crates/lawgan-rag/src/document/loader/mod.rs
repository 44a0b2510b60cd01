mod pdf;
mod reviews;

use std::path::PathBuf;

pub use pdf::PdfDirLoader;
pub use reviews::ReviewCsvLoader;

use super::Document;
use crate::error::RagError;

/// The configured ingestion sources. Both are optional; an unconfigured source
/// is skipped, while a configured but unreadable one fails the whole load.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub reviews_csv: Option<PathBuf>,
    pub pdf_dir: Option<PathBuf>,
}

impl SourceSet {
    /// Load every configured source into a flat document list, review rows
    /// first, then PDF pages in sorted file order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SourceUnavailable`] if a configured path cannot be
    /// read, or a parse error from the underlying loader.
    pub async fn load_all(&self) -> Result<Vec<Document>, RagError> {
        let mut documents = Vec::new();

        if let Some(path) = &self.reviews_csv {
            let loaded = ReviewCsvLoader::new(path.clone()).load().await?;
            tracing::info!(count = loaded.len(), path = %path.display(), "loaded review rows");
            documents.extend(loaded);
        }

        if let Some(dir) = &self.pdf_dir {
            let loaded = PdfDirLoader::new(dir.clone()).load().await?;
            tracing::info!(count = loaded.len(), dir = %dir.display(), "loaded PDF pages");
            documents.extend(loaded);
        }

        Ok(documents)
    }
}
