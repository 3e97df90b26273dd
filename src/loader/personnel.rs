//! Personnel roster sheets: one parent profile per employee plus a fan of
//! question-shaped child documents that point back at it.

use tracing::debug;

use super::spreadsheet::{is_blank, SheetGrid};
use crate::document::{meta, DocType, Document};

pub const PERSONNEL_SHEET_MARKER: &str = "danh sách nhân viên";
pub const PERSONNEL_FILE_MARKER: &str = "nhân sự";
pub const PERSONNEL_SOURCE: &str = "Danh sách nhân viên";

const HEADER_ROW: usize = 6;
const NAME_COLUMN: &str = "Họ và tên";
const DEPT_COLUMN: &str = "Phòng ban";
const ROLE_COLUMNS: [&str; 4] = ["Chức danh/Vị trí", "Chức danh/vị trí", "Chức vụ", "Vị trí"];

/// (profile label, source column). The labels also name the fields that are
/// excluded from the supplementary section.
const PROFILE_FIELDS: [(&str, &str); 10] = [
    ("Họ và tên", NAME_COLUMN),
    ("Phòng ban", DEPT_COLUMN),
    ("Chức vụ", ""),
    ("Số điện thoại", "Số điện thoại"),
    ("Email", "Email công việc"),
    ("Số CCCD", "Số CCCD"),
    ("Ngày bắt đầu", "Ngày bắt đầu"),
    ("Ngày chính thức", "Ngày chính thức"),
    ("Loại hợp đồng", "Loại hợp đồng"),
    ("Trạng thái", "Trạng thái"),
];

const IGNORED_VALUES: [&str; 5] = ["nan", "0", "0.0", "nat", ""];

pub fn is_personnel_sheet(sheet_name: &str, filename: &str) -> bool {
    sheet_name.to_lowercase().contains(PERSONNEL_SHEET_MARKER)
        || filename.to_lowercase().contains(PERSONNEL_FILE_MARKER)
}

/// Column labels from the header row, falling back to the row above it for
/// merged cells, then to `Col_{i}`. Duplicates get `_1`, `_2`, ...
pub fn resolve_headers(grid: &SheetGrid) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(grid.width());
    for col in 0..grid.width() {
        let main = grid.cell(HEADER_ROW, col).trim();
        let top = grid.cell(HEADER_ROW - 1, col).trim();

        let label = if is_blank(main) && !is_blank(top) {
            top.to_string()
        } else if is_blank(main) {
            format!("Col_{col}")
        } else {
            main.to_string()
        };

        let mut unique = label.clone();
        let mut suffix = 1;
        while headers.contains(&unique) {
            unique = format!("{label}_{suffix}");
            suffix += 1;
        }
        headers.push(unique);
    }
    headers
}

struct Row<'a> {
    headers: &'a [String],
    cells: &'a [String],
}

impl Row<'_> {
    fn get(&self, column: &str) -> &str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|idx| self.cells.get(idx))
            .map(|v| v.trim())
            .unwrap_or("")
    }
}

pub fn load_personnel_sheet(grid: &SheetGrid) -> Vec<Document> {
    let headers = resolve_headers(grid);
    let mut documents = Vec::new();

    for row_index in (HEADER_ROW + 1)..grid.rows().len() {
        let Some(cells) = grid.row(row_index) else {
            continue;
        };
        let row = Row {
            headers: &headers,
            cells,
        };

        let name = row.get(NAME_COLUMN);
        if is_blank(name) || name.to_lowercase().contains("danh sách") || name == NAME_COLUMN {
            continue;
        }

        let dept = row.get(DEPT_COLUMN);
        let job = ROLE_COLUMNS
            .iter()
            .map(|col| row.get(col))
            .find(|value| !is_blank(value))
            .unwrap_or("");

        debug!("Indexing: {} - {}", name, dept);
        documents.extend(employee_documents(&row, name, dept, job));
    }

    documents
}

fn employee_documents(row: &Row<'_>, name: &str, dept: &str, job: &str) -> Vec<Document> {
    let mut content = format!("### HỒ SƠ CHI TIẾT: {}\n", name.to_uppercase());
    for (label, column) in PROFILE_FIELDS {
        let value = match label {
            "Họ và tên" => name,
            "Phòng ban" => dept,
            "Chức vụ" => job,
            _ => row.get(column),
        };
        let shown = if label == "Phòng ban" { "Bộ phận" } else { label };
        content.push_str(&format!("- {shown}: {value}\n"));
    }

    let extras: Vec<String> = row
        .headers
        .iter()
        .zip(row.cells.iter())
        .filter_map(|(header, value)| {
            let value = value.trim();
            if IGNORED_VALUES.contains(&value.to_lowercase().as_str()) || header.contains("Col_") {
                return None;
            }
            let clean = header.replace('\n', " ").trim().to_string();
            let is_profile_field = PROFILE_FIELDS.iter().any(|(label, _)| *label == clean);
            (!is_profile_field).then(|| format!("- {clean}: {value}"))
        })
        .collect();

    if !extras.is_empty() {
        content.push_str("\n**Thông tin bổ sung:**\n");
        content.push_str(&extras.join("\n"));
    }

    let parent = Document::new(content)
        .with_meta(meta::NAME, name.to_lowercase())
        .with_meta(meta::DEPT, dept.to_lowercase())
        .with_meta(meta::JOB, job.to_lowercase())
        .with_meta(meta::SOURCE, PERSONNEL_SOURCE);

    let questions = [
        format!("số điện thoại của {name} là bao nhiêu?"),
        format!("email của {name} là gì?"),
        format!("{name} làm việc ở bộ phận nào?"),
        format!("thông tin liên hệ của {name}"),
        format!("{name} giữ chức vụ gì?"),
        format!("tìm hồ sơ nhân viên {name}"),
    ];

    let mut documents = Vec::with_capacity(questions.len() + 1);
    for question in questions {
        let mut child = parent.clone().with_doc_type(DocType::Child);
        child.content = format!("Câu hỏi: {question}\nTrả về: Hồ sơ của {name}");
        documents.push(child);
    }
    documents.insert(0, parent.with_doc_type(DocType::Parent));
    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(data_rows: &[&[&str]]) -> SheetGrid {
        let header: Vec<&str> = vec![
            "STT",
            "Họ và tên",
            "Phòng ban",
            "",
            "Số điện thoại",
            "Email công việc",
            "Số CCCD",
            "Ghi chú",
        ];
        let mut rows: Vec<Vec<String>> = (0..5).map(|_| vec![String::new(); 8]).collect();
        rows[0][0] = "DANH SÁCH NHÂN VIÊN".to_string();
        let mut top = vec![String::new(); 8];
        top[3] = "Chức danh/Vị trí".to_string();
        rows.push(top);
        rows.push(header.iter().map(|s| s.to_string()).collect());
        for row in data_rows {
            rows.push(row.iter().map(|s| s.to_string()).collect());
        }
        SheetGrid::from_rows(rows)
    }

    #[test]
    fn detects_personnel_sheets_by_sheet_or_file_name() {
        assert!(is_personnel_sheet("DANH SÁCH NHÂN VIÊN", "a.xlsx"));
        assert!(is_personnel_sheet("Sheet1", "Hồ sơ Nhân Sự 2024.xlsx"));
        assert!(!is_personnel_sheet("Kho", "taisan.xlsx"));
    }

    #[test]
    fn headers_fall_back_to_row_above_then_placeholder() {
        let grid = roster(&[]);
        let headers = resolve_headers(&grid);
        assert_eq!(headers[1], "Họ và tên");
        assert_eq!(headers[3], "Chức danh/Vị trí");
        assert_eq!(headers.len(), 8);

        let mut rows = grid.rows().to_vec();
        rows[6][7] = "Họ và tên".to_string();
        rows[6][0] = String::new();
        let headers = resolve_headers(&SheetGrid::from_rows(rows));
        assert_eq!(headers[0], "Col_0");
        assert_eq!(headers[7], "Họ và tên_1");
    }

    #[test]
    fn each_employee_yields_parent_and_six_children() {
        let grid = roster(&[
            &["1", "Nguyễn Văn A", "Kế toán", "Trưởng phòng", "0909123456", "a@cty.vn", "0123", "Làm từ xa"],
            &["", "Họ và tên", "", "", "", "", "", ""],
            &["", "", "Kế toán", "", "", "", "", ""],
        ]);
        let docs = load_personnel_sheet(&grid);
        assert_eq!(docs.len(), 7);

        let parent = &docs[0];
        assert_eq!(parent.doc_type(), Some(DocType::Parent));
        assert_eq!(parent.name(), Some("nguyễn văn a"));
        assert_eq!(parent.dept(), Some("kế toán"));
        assert_eq!(parent.get(meta::JOB), Some("trưởng phòng"));
        assert!(parent.content.starts_with("### HỒ SƠ CHI TIẾT: NGUYỄN VĂN A\n"));
        assert!(parent.content.contains("- Bộ phận: Kế toán\n"));
        assert!(parent.content.contains("- Chức vụ: Trưởng phòng\n"));
        assert!(parent.content.contains("- Email: a@cty.vn\n"));
        assert!(parent.content.contains("**Thông tin bổ sung:**"));
        assert!(parent.content.contains("- Ghi chú: Làm từ xa"));
        assert!(parent.content.contains("- STT: 1"));

        let children: Vec<_> = docs[1..].iter().collect();
        assert!(children.iter().all(|d| d.doc_type() == Some(DocType::Child)));
        assert!(children.iter().all(|d| d.name() == Some("nguyễn văn a")));
        assert_eq!(
            children[0].content,
            "Câu hỏi: số điện thoại của Nguyễn Văn A là bao nhiêu?\nTrả về: Hồ sơ của Nguyễn Văn A"
        );
    }
}
