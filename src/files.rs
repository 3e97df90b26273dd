//! Flat directory listings and filename checks for the admin file endpoints.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// Local time, `dd/mm/YYYY HH:MM`.
    pub modified: String,
}

/// Regular files directly under `dir`, optionally restricted to one extension.
/// A missing directory lists as empty.
pub fn list_dir(dir: &Path, extension: Option<&str>) -> Vec<FileEntry> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<FileEntry> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            if let Some(ext) = extension {
                if path.extension().and_then(|e| e.to_str()) != Some(ext) {
                    return None;
                }
            }
            let name = path.file_name()?.to_str()?.to_string();
            let modified = meta
                .modified()
                .map(|t| DateTime::<Local>::from(t).format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default();
            Some(FileEntry {
                name,
                size: meta.len(),
                modified,
            })
        })
        .collect();

    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Accepts a bare file name only; rejects separators, traversal and absolute paths.
pub fn sanitize_filename(filename: &str) -> Option<&str> {
    if filename.contains('/') || filename.contains('\\') {
        return None;
    }
    let base = Path::new(filename).file_name().and_then(|n| n.to_str())?;
    if base == filename && !filename.contains("..") {
        Some(base)
    } else {
        None
    }
}
