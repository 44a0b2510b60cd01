use lawgan_rag::{Document, SourceKind};

const PERSONA: &str = "You are Lawgan, your personal legal assistant.\n\
You are an expert legal assistant with deep knowledge of legal principles, case law, \
statutes, and constitutional law, including the Constitution of the Democratic Socialist \
Republic of Sri Lanka.\n\
Provide accurate, concise, and professional responses to legal questions.\n\
Use the provided documents, which may include restaurant reviews and legal texts \
extracted from PDFs (such as constitutional provisions), to inform your answer.\n\
Prioritize legal content from PDFs, especially constitutional texts, for questions \
related to legal or constitutional matters. Use restaurant reviews only if they contain \
relevant legal context (e.g., consumer protection or liability issues).";

const STYLE: &str = "Provide a clear and precise response, avoiding legal jargon where \
possible unless specifically requested. If the question relates to Sri Lankan law, \
reference relevant constitutional provisions or other legal documents when applicable.";

/// Assemble the grounded generation prompt from the retrieved documents and
/// the verbatim user question. Pure and deterministic.
#[must_use]
pub fn build_prompt(question: &str, documents: &[Document]) -> String {
    let mut rendered = String::new();
    if documents.is_empty() {
        rendered.push_str("(no relevant documents found)\n");
    }
    for (i, doc) in documents.iter().enumerate() {
        rendered.push_str(&format!("[{} | {}]\n{}\n", i + 1, label(doc), doc.text));
    }

    format!(
        "{PERSONA}\n\nRelevant documents:\n{rendered}\nUser's legal question: {question}\n\n{STYLE}"
    )
}

fn label(doc: &Document) -> String {
    match doc.metadata.source {
        SourceKind::Pdf => {
            let file = doc
                .metadata
                .extra
                .get("file")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            match doc.metadata.extra.get("page").and_then(serde_json::Value::as_u64) {
                Some(page) => format!("legal document {file}, page {page}"),
                None => format!("legal document {file}"),
            }
        }
        SourceKind::Review => {
            let rating = doc
                .metadata
                .extra
                .get("rating")
                .and_then(serde_json::Value::as_f64);
            match rating {
                Some(r) => format!("restaurant review, rating {r}"),
                None => "restaurant review".to_owned(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lawgan_rag::DocumentMetadata;
    use serde_json::json;

    use super::*;

    fn pdf_doc() -> Document {
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

    fn review_doc() -> Document {
        Document {
            id: "csv_0".into(),
            text: "Good place".into(),
            metadata: DocumentMetadata {
                source: SourceKind::Review,
                extra: BTreeMap::from([("rating".to_owned(), json!(5.0))]),
            },
        }
    }

    #[test]
    fn prompt_contains_question_verbatim() {
        let prompt = build_prompt("What is due process?", &[pdf_doc()]);
        assert!(prompt.contains("User's legal question: What is due process?"));
    }

    #[test]
    fn prompt_contains_persona_and_style() {
        let prompt = build_prompt("q", &[]);
        assert!(prompt.contains("You are Lawgan"));
        assert!(prompt.contains("Sri Lanka"));
        assert!(prompt.contains("avoiding legal jargon"));
    }

    #[test]
    fn documents_rendered_in_rank_order_with_labels() {
        let prompt = build_prompt("q", &[pdf_doc(), review_doc()]);
        let pdf_pos = prompt.find("legal document constitution.pdf, page 3").unwrap();
        let review_pos = prompt.find("restaurant review, rating 5").unwrap();
        assert!(pdf_pos < review_pos);
        assert!(prompt.contains("Article 12: equality before the law"));
    }

    #[test]
    fn empty_retrieval_is_stated_explicitly() {
        let prompt = build_prompt("q", &[]);
        assert!(prompt.contains("(no relevant documents found)"));
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let docs = [pdf_doc(), review_doc()];
        assert_eq!(build_prompt("q", &docs), build_prompt("q", &docs));
    }
}
