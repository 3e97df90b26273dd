//! Turns the source directory into documents.
//!
//! Dispatch is by file extension. A file (or sheet) that fails to parse is
//! logged and skipped; it never aborts the rest of the load.

pub mod pdf;
pub mod personnel;
pub mod spreadsheet;
pub mod text;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::document::Document;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("spreadsheet {file}: {message}")]
    Spreadsheet { file: String, message: String },
    #[error("pdf {file}: {message}")]
    Pdf { file: String, message: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported file type: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Spreadsheet,
    Pdf,
    Text,
    Csv,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(SourceKind::Spreadsheet),
            "pdf" => Some(SourceKind::Pdf),
            "txt" | "md" => Some(SourceKind::Text),
            "csv" => Some(SourceKind::Csv),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    data_dir: PathBuf,
}

impl DocumentLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Loads every supported file, in file-name order.
    pub fn load_directory(&self) -> Vec<Document> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Cannot read source dir {}: {}", self.data_dir.display(), err);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut documents = Vec::new();
        for path in files {
            match load_file(&path) {
                Ok(docs) => {
                    info!("Loaded {} documents from {}", docs.len(), path.display());
                    documents.extend(docs);
                }
                Err(LoadError::Unsupported(_)) => {}
                Err(err) => warn!("Skipping {}: {}", path.display(), err),
            }
        }

        documents.retain(|doc| !doc.content.trim().is_empty());
        documents
    }
}

pub fn load_file(path: &Path) -> Result<Vec<Document>, LoadError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    match SourceKind::from_path(path) {
        Some(SourceKind::Spreadsheet) => spreadsheet::load_workbook(path, &filename),
        Some(SourceKind::Pdf) => pdf::load_pdf(path, &filename),
        Some(SourceKind::Text) => text::load_text(path, &filename),
        Some(SourceKind::Csv) => text::load_csv(path, &filename),
        None => Err(LoadError::Unsupported(filename)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::meta;

    #[test]
    fn extensions_map_to_loaders() {
        assert_eq!(
            SourceKind::from_path(Path::new("a/Nhân sự.XLSX")),
            Some(SourceKind::Spreadsheet)
        );
        assert_eq!(SourceKind::from_path(Path::new("x.md")), Some(SourceKind::Text));
        assert_eq!(SourceKind::from_path(Path::new("x.docx")), None);
    }

    #[test]
    fn broken_files_are_skipped_without_aborting() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b_notes.txt"), "Nội quy công ty").unwrap();
        std::fs::write(tmp.path().join("a_broken.xlsx"), b"not a workbook").unwrap();
        std::fs::write(tmp.path().join("c_image.png"), b"\x89PNG").unwrap();
        std::fs::write(tmp.path().join("d.csv"), "k,v\nx,1\n").unwrap();

        let docs = DocumentLoader::new(tmp.path()).load_directory();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get(meta::SOURCE), Some("b_notes.txt"));
        assert_eq!(docs[1].get(meta::SOURCE), Some("d.csv"));
    }

    #[test]
    fn pdf_that_crashes_the_parser_does_not_lose_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a_bad.pdf"), pdf::tests::pdf_without_resources()).unwrap();
        std::fs::write(tmp.path().join("b_ok.txt"), "Quy định chấm công").unwrap();

        let docs = DocumentLoader::new(tmp.path()).load_directory();
        let last = docs.last().unwrap();
        assert_eq!(last.get(meta::SOURCE), Some("b_ok.txt"));
        assert_eq!(last.content, "Quy định chấm công");
    }

    #[test]
    fn missing_directory_loads_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let loader = DocumentLoader::new(tmp.path().join("absent"));
        assert!(loader.load_directory().is_empty());
    }
}
