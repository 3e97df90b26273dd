use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use super::LoadError;
use crate::document::{meta, Document};

/// One document per page that carries any text.
pub fn load_pdf(path: &Path, filename: &str) -> Result<Vec<Document>, LoadError> {
    let bytes = std::fs::read(path)?;
    let pages = extract_pages(&bytes, filename)?;
    Ok(page_documents(pages, filename))
}

/// `pdf_extract` panics on some malformed files; a panic counts as a
/// failure of this file only.
fn extract_pages(bytes: &[u8], filename: &str) -> Result<Vec<String>, LoadError> {
    let failure = |message: String| LoadError::Pdf {
        file: filename.to_string(),
        message,
    };

    match catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    })) {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(err)) => Err(failure(err.to_string())),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(failure(format!("parser panicked: {reason}")))
        }
    }
}

fn page_documents(pages: Vec<String>, filename: &str) -> Vec<Document> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(idx, text)| {
            let text = text.replace('\0', "");
            let text = text.trim();
            (!text.is_empty()).then(|| {
                Document::new(text)
                    .with_meta(meta::SOURCE, filename)
                    .with_meta(meta::PAGE, (idx + 1).to_string())
            })
        })
        .collect()
}
