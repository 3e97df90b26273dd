//! Query tokenization and intent classification.

/// Function words dropped from queries. Domain words such as "số",
/// "điện", "thoại" and "email" are intentionally absent.
pub const STOP_WORDS: [&str; 29] = [
    "cho", "tôi", "xin", "là", "gì", "của", "ai", "anh", "chị", "em", "nhân", "viên", "phòng",
    "ban", "danh", "sách", "liệt", "kê", "sự", "bộ", "phận", "hãy", "giúp", "thế", "nào", "làm",
    "sao", "bao", "nhiêu",
];

pub const LIST_PHRASES: [&str; 6] = ["danh sách", "liệt kê", "tất cả", "những ai", "danh sach", "bảng"];

pub const NEWS_PHRASES: [&str; 7] = [
    "thông báo",
    "tin tức",
    "lịch",
    "nghỉ",
    "tết",
    "quy định",
    "chính sách",
];

/// Keywords that signal a calendar question rather than a person.
pub const CALENDAR_KEYWORDS: [&str; 3] = ["lịch", "nghỉ", "tết"];

const MIN_KEYWORD_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryProfile {
    pub lowered: String,
    /// Meaningful tokens in query order.
    pub keywords: Vec<String>,
    /// Lifts the subject cap; the relative threshold still applies.
    pub is_list_request: bool,
    /// Forces semantic search to run alongside keyword matching.
    pub is_news_request: bool,
}

impl QueryProfile {
    pub fn analyze(query: &str, department_code: &str) -> Self {
        let lowered = query.to_lowercase();
        let keywords = lowered
            .split_whitespace()
            .map(|token| token.trim_matches(|c: char| c.is_ascii_punctuation() && c != '&'))
            .filter(|token| !STOP_WORDS.contains(token))
            .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS || *token == department_code)
            .map(str::to_string)
            .collect();

        let is_list_request = LIST_PHRASES.iter().any(|p| lowered.contains(p));
        let is_news_request = NEWS_PHRASES.iter().any(|p| lowered.contains(p));

        Self {
            lowered,
            keywords,
            is_list_request,
            is_news_request,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.lowered.trim().is_empty()
    }

    /// Keywords usable for matching subject names in news mode.
    pub fn non_calendar_keywords(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .map(String::as_str)
            .filter(|k| !CALENDAR_KEYWORDS.contains(k))
    }
}
