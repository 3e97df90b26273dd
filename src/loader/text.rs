use std::path::Path;

use super::LoadError;
use crate::document::{meta, Document};

pub fn load_text(path: &Path, filename: &str) -> Result<Vec<Document>, LoadError> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![
        Document::new(content.into_owned()).with_meta(meta::SOURCE, filename)
    ])
}

pub fn load_csv(path: &Path, filename: &str) -> Result<Vec<Document>, LoadError> {
    let bytes = std::fs::read(path)?;
    parse_csv(&bytes, filename)
}

fn parse_csv(data: &[u8], filename: &str) -> Result<Vec<Document>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.clone();

    let mut documents = Vec::new();
    for record in reader.records() {
        let record = record?;
        let pairs: Vec<String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        if pairs.is_empty() {
            continue;
        }

        let content = format!("FILE: {filename}\n{}", pairs.join(" | "));
        documents.push(Document::new(content).with_meta(meta::SOURCE, filename));
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_skip_empty_cells() {
        let data = "Tên,Phòng,Ghi chú\nMáy chiếu,Họp 1,\n,,\nLoa,,Hỏng\n";
        let docs = parse_csv(data.as_bytes(), "thietbi.csv").unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "FILE: thietbi.csv\nTên: Máy chiếu | Phòng: Họp 1");
        assert_eq!(docs[1].content, "FILE: thietbi.csv\nTên: Loa | Ghi chú: Hỏng");
    }

    #[test]
    fn blank_text_file_produces_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let blank = tmp.path().join("blank.txt");
        std::fs::write(&blank, "  \n\n").unwrap();
        assert!(load_text(&blank, "blank.txt").unwrap().is_empty());

        let note = tmp.path().join("note.md");
        std::fs::write(&note, "# Nội quy\nĐi làm đúng giờ").unwrap();
        let docs = load_text(&note, "note.md").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get(meta::SOURCE), Some("note.md"));
    }
}
