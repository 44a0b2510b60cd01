pub mod loader;

use std::collections::{BTreeMap, HashMap};

pub use loader::{PdfDirLoader, ReviewCsvLoader, SourceSet};

/// Origin kind of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Tabular review record.
    Review,
    /// Page extracted from a PDF file.
    Pdf,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Review => "csv",
            Self::Pdf => "pdf",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(Self::Review),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    pub source: SourceKind,
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// The unit of retrievable knowledge. Immutable after ingestion; the id is
/// deterministic per source unit so re-ingestion upserts rather than duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

const KEY_DOC_ID: &str = "doc_id";
const KEY_TEXT: &str = "text";
const KEY_SOURCE: &str = "source";

impl Document {
    /// Flatten the document into a vector store payload.
    #[must_use]
    pub fn to_payload(&self) -> HashMap<String, serde_json::Value> {
        let mut payload = HashMap::with_capacity(self.metadata.extra.len() + 3);
        payload.insert(KEY_DOC_ID.to_owned(), self.id.clone().into());
        payload.insert(KEY_TEXT.to_owned(), self.text.clone().into());
        payload.insert(
            KEY_SOURCE.to_owned(),
            self.metadata.source.as_str().to_owned().into(),
        );
        for (k, v) in &self.metadata.extra {
            payload.insert(k.clone(), v.clone());
        }
        payload
    }

    /// Rebuild a document from a stored payload. Returns `None` if the payload
    /// is missing any of the reserved fields.
    #[must_use]
    pub fn from_payload(mut payload: HashMap<String, serde_json::Value>) -> Option<Self> {
        let id = payload.remove(KEY_DOC_ID)?.as_str()?.to_owned();
        let text = payload.remove(KEY_TEXT)?.as_str()?.to_owned();
        let source = SourceKind::parse(payload.remove(KEY_SOURCE)?.as_str()?)?;
        Some(Self {
            id,
            text,
            metadata: DocumentMetadata {
                source,
                extra: payload.into_iter().collect(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Document {
        Document {
            id: "pdf_constitution.pdf_3".into(),
            text: "Article 12: equality before the law".into(),
            metadata: DocumentMetadata {
                source: SourceKind::Pdf,
                extra: BTreeMap::from([
                    ("file".to_owned(), json!("constitution.pdf")),
                    ("page".to_owned(), json!(3)),
                ]),
            },
        }
    }

    #[test]
    fn payload_round_trip_preserves_document() {
        let doc = sample_document();
        let restored = Document::from_payload(doc.to_payload()).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn payload_carries_source_tag() {
        let payload = sample_document().to_payload();
        assert_eq!(payload["source"], json!("pdf"));
        assert_eq!(payload["doc_id"], json!("pdf_constitution.pdf_3"));
    }

    #[test]
    fn from_payload_rejects_missing_fields() {
        let mut payload = sample_document().to_payload();
        payload.remove("text");
        assert!(Document::from_payload(payload).is_none());
    }

    #[test]
    fn from_payload_rejects_unknown_source() {
        let mut payload = sample_document().to_payload();
        payload.insert("source".into(), json!("web"));
        assert!(Document::from_payload(payload).is_none());
    }

    #[test]
    fn source_kind_string_round_trip() {
        assert_eq!(SourceKind::parse("csv"), Some(SourceKind::Review));
        assert_eq!(SourceKind::parse(SourceKind::Pdf.as_str()), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::parse("other"), None);
    }
}
