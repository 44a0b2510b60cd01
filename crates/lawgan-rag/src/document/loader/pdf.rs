use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::json;

use super::super::{Document, DocumentMetadata, SourceKind};
use crate::error::RagError;

/// Loads every `*.pdf` in a directory, one document per page with
/// non-whitespace extracted text.
#[derive(Debug, Clone)]
pub struct PdfDirLoader {
    dir: PathBuf,
}

impl PdfDirLoader {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Extract text page by page from each PDF in sorted file-name order.
    /// Blank pages are dropped silently; surviving pages get id
    /// `pdf_<file name>_<1-based page number>`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SourceUnavailable`] if the directory cannot be
    /// read, or [`RagError::Pdf`] if a file fails to parse.
    pub async fn load(&self) -> Result<Vec<Document>, RagError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_sync(&dir))
            .await
            .map_err(|e| RagError::Io(std::io::Error::other(e)))?
    }
}

fn load_sync(dir: &Path) -> Result<Vec<Document>, RagError> {
    let entries = std::fs::read_dir(dir).map_err(|e| RagError::SourceUnavailable {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut pdf_paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdf_paths.sort();

    let mut documents = Vec::new();
    for path in pdf_paths {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_owned();
        let pages = pdf_extract::extract_text_by_pages(&path)
            .map_err(|e| RagError::Pdf(format!("{}: {e}", path.display())))?;
        documents.extend(page_documents(&file_name, pages));
    }
    Ok(documents)
}

/// Turn extracted pages into documents, skipping whitespace-only pages.
/// Page numbers are 1-based in both the id and the metadata.
fn page_documents(file_name: &str, pages: Vec<String>) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(index, page)| {
            let text = page.trim();
            if text.is_empty() {
                return None;
            }
            let page_number = index + 1;
            Some(Document {
                id: format!("pdf_{file_name}_{page_number}"),
                text: text.to_owned(),
                metadata: DocumentMetadata {
                    source: SourceKind::Pdf,
                    extra: BTreeMap::from([
                        ("file".to_owned(), json!(file_name)),
                        ("page".to_owned(), json!(page_number)),
                    ]),
                },
            })
        })
        .collect()
}
