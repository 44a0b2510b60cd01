use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::json;

use super::super::{Document, DocumentMetadata, SourceKind};
use crate::error::RagError;

/// Loads tabular restaurant review records, one document per row.
#[derive(Debug, Clone)]
pub struct ReviewCsvLoader {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Rating")]
    rating: f64,
    #[serde(rename = "Review")]
    review: String,
}

impl ReviewCsvLoader {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read every row in file order. Row `i` gets id `csv_<i>` (0-based) and
    /// text `"<Title> <Review>"`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::SourceUnavailable`] if the file cannot be opened,
    /// or [`RagError::Csv`] if a row fails to parse.
    pub async fn load(&self) -> Result<Vec<Document>, RagError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_sync(&path))
            .await
            .map_err(|e| RagError::Io(std::io::Error::other(e)))?
    }
}

fn load_sync(path: &Path) -> Result<Vec<Document>, RagError> {
    let file = std::fs::File::open(path).map_err(|e| RagError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut documents = Vec::new();
    for (i, row) in reader.deserialize::<ReviewRow>().enumerate() {
        let row = row?;
        documents.push(Document {
            id: format!("csv_{i}"),
            text: format!("{} {}", row.title, row.review),
            metadata: DocumentMetadata {
                source: SourceKind::Review,
                extra: BTreeMap::from([
                    ("rating".to_owned(), json!(row.rating)),
                    ("date".to_owned(), json!(row.date)),
                ]),
            },
        });
    }
    Ok(documents)
}
