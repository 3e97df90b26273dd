use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::{debug, warn};

use super::personnel;
use super::LoadError;
use crate::document::{meta, DocType, Document};

/// A worksheet rendered to strings, addressed by absolute sheet coordinates
/// (row 0 is the first row of the sheet even if it is blank).
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn from_range(range: &Range<Data>) -> Self {
        let Some((end_row, end_col)) = range.end() else {
            return Self::default();
        };

        let rows = (0..=end_row)
            .map(|row| {
                (0..=end_col)
                    .map(|col| {
                        range
                            .get_value((row, col))
                            .map(render_cell)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Renders a cell the way a reader would type it: whole floats lose `.0`,
/// dates become ISO dates.
pub fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == chrono::NaiveTime::MIN => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Loads every sheet of a workbook. A sheet that fails to parse is skipped.
pub fn load_workbook(path: &Path, filename: &str) -> Result<Vec<Document>, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::Spreadsheet {
        file: filename.to_string(),
        message: e.to_string(),
    })?;

    let mut documents = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(err) => {
                warn!("Skipping sheet '{}' in {}: {}", sheet_name, filename, err);
                continue;
            }
        };

        let grid = SheetGrid::from_range(&range);
        let sheet_docs = if personnel::is_personnel_sheet(&sheet_name, filename) {
            personnel::load_personnel_sheet(&grid)
        } else {
            load_generic_sheet(&grid, filename, &sheet_name)
        };
        debug!(
            "Sheet '{}' of {} produced {} documents",
            sheet_name,
            filename,
            sheet_docs.len()
        );
        documents.extend(sheet_docs);
    }

    Ok(documents)
}

/// One document per data row, header taken from the first non-empty row.
pub fn load_generic_sheet(grid: &SheetGrid, filename: &str, sheet_name: &str) -> Vec<Document> {
    let Some(header_index) = grid
        .rows()
        .iter()
        .position(|row| row.iter().any(|cell| !cell.trim().is_empty()))
    else {
        return Vec::new();
    };

    let headers: Vec<String> = (0..grid.width())
        .map(|col| {
            let label = grid.cell(header_index, col).trim();
            if label.is_empty() {
                format!("Unnamed: {col}")
            } else {
                label.to_string()
            }
        })
        .collect();

    let mut documents = Vec::new();
    for row in (header_index + 1)..grid.rows().len() {
        let pairs: Vec<String> = headers
            .iter()
            .enumerate()
            .filter_map(|(col, header)| {
                let value = grid.cell(row, col).trim();
                (!is_blank(value)).then(|| format!("{header}: {value}"))
            })
            .collect();

        if pairs.is_empty() {
            continue;
        }

        let content = format!(
            "NGUỒN: {filename} (Sheet: {sheet_name})\n{}",
            pairs.join(" | ")
        );
        documents.push(
            Document::new(content)
                .with_meta(meta::SOURCE, filename)
                .with_meta(meta::SHEET, sheet_name)
                .with_doc_type(DocType::Excel),
        );
    }
    documents
}
