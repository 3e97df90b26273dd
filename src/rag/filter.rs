//! Line-level redaction and per-query compression of retrieved documents.

pub const SENSITIVE_MARKERS: [&str; 7] = [
    "CCCD",
    "CMND",
    "SỐ THẺ",
    "MÃ SỐ THUẾ",
    "MST",
    "PASSWORD",
    "MẬT KHẨU",
];

/// Documents containing these (uppercased) are kept whole.
pub const VERBATIM_MARKERS: [&str; 2] = ["HÀNH CHÍNH", "THÔNG BÁO"];

pub const STRUCTURAL_HEADERS: [&str; 3] = ["HỒ SƠ", "HỌ VÀ TÊN", "BỘ PHẬN"];

pub const CONTACT_TERMS: [&str; 5] = ["số", "điện", "thoại", "sđt", "email"];

pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Drops every line carrying a sensitive marker. `None` when nothing is left.
pub fn redact(document: &str) -> Option<String> {
    let safe: Vec<&str> = document
        .split('\n')
        .filter(|line| {
            let upper = line.to_uppercase();
            !SENSITIVE_MARKERS.iter().any(|m| upper.contains(m))
        })
        .collect();

    let text = safe.join("\n");
    (!text.trim().is_empty()).then_some(text)
}

/// Keeps structural header lines, then lines mentioning a query keyword or a
/// contact term. Announcement and administrative documents pass unchanged.
pub fn compress(document: &str, keywords: &[String]) -> String {
    let upper = document.to_uppercase();
    if VERBATIM_MARKERS.iter().any(|m| upper.contains(m)) {
        return document.to_string();
    }

    let lines: Vec<&str> = document.split('\n').collect();
    let important: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| {
            let upper = line.to_uppercase();
            STRUCTURAL_HEADERS.iter().any(|h| upper.contains(h))
        })
        .collect();

    let relevant = lines.iter().copied().filter(|line| {
        let lower = line.to_lowercase();
        let mentions = keywords.iter().any(|k| lower.contains(k.as_str()))
            || CONTACT_TERMS.iter().any(|t| lower.contains(t));
        mentions && !important.contains(line)
    });

    important
        .iter()
        .copied()
        .chain(relevant)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "### HỒ SƠ CHI TIẾT: NGUYỄN VĂN A\n\
        - Họ và tên: Nguyễn Văn A\n\
        - Bộ phận: Kế toán\n\
        - Chức vụ: Trưởng phòng\n\
        - Số điện thoại: 0909123456\n\
        - Email: a@cty.vn\n\
        - Số CCCD: 079123456789\n\
        - Loại hợp đồng: Chính thức";

    #[test]
    fn sensitive_lines_are_removed() {
        let redacted = redact(PROFILE).unwrap();
        assert!(!redacted.contains("079123456789"));
        assert!(redacted.contains("0909123456"));
        assert_eq!(redact("Số CMND: 1\nMật khẩu wifi: abc"), None);
        assert!(redact("mst: 0312").is_none());
    }

    #[test]
    fn compression_keeps_headers_then_relevant_lines() {
        let redacted = redact(PROFILE).unwrap();
        let compressed = compress(&redacted, &["nguyễn".to_string()]);
        assert_eq!(
            compressed,
            "### HỒ SƠ CHI TIẾT: NGUYỄN VĂN A\n\
             - Họ và tên: Nguyễn Văn A\n\
             - Bộ phận: Kế toán\n\
             - Số điện thoại: 0909123456\n\
             - Email: a@cty.vn"
        );
    }

    #[test]
    fn announcements_pass_verbatim() {
        let notice = "===== THÔNG BÁO =====\nNghỉ Tết từ 28/01\nÁp dụng: Toàn công ty";
        assert_eq!(compress(notice, &[]), notice);
    }
}
