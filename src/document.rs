use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Well-known metadata keys.
pub mod meta {
    pub const NAME: &str = "name";
    pub const DEPT: &str = "dept";
    pub const JOB: &str = "job";
    pub const DOC_TYPE: &str = "doc_type";
    pub const SOURCE: &str = "source";
    pub const SHEET: &str = "sheet";
    pub const PAGE: &str = "page";
    pub const TITLE: &str = "title";
    pub const SPACE_ID: &str = "space_id";
    pub const RECEIVED_AT: &str = "received_at";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    /// Full profile of one subject.
    Parent,
    /// Short question-shaped pointer back to a parent.
    Child,
    Announce,
    Excel,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Parent => "parent",
            DocType::Child => "child",
            DocType::Announce => "announce",
            DocType::Excel => "excel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "parent" => Some(DocType::Parent),
            "child" => Some(DocType::Child),
            "announce" => Some(DocType::Announce),
            "excel" => Some(DocType::Excel),
            _ => None,
        }
    }
}

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn with_doc_type(self, doc_type: DocType) -> Self {
        self.with_meta(meta::DOC_TYPE, doc_type.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Lowercased subject name; `None` when absent or blank.
    pub fn name(&self) -> Option<&str> {
        self.get(meta::NAME).filter(|name| !name.is_empty())
    }

    pub fn dept(&self) -> Option<&str> {
        self.get(meta::DEPT).filter(|dept| !dept.is_empty())
    }

    pub fn doc_type(&self) -> Option<DocType> {
        self.get(meta::DOC_TYPE).and_then(DocType::parse)
    }

    pub fn is_parent(&self) -> bool {
        self.doc_type() == Some(DocType::Parent)
    }

    /// Hex SHA-256 over the canonical metadata (sorted keys) and the content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (key, value) in &self.metadata {
            hasher.update(key.as_bytes());
            hasher.update([0x1f]);
            hasher.update(value.as_bytes());
            hasher.update([0x1e]);
        }
        hasher.update([0x1d]);
        hasher.update(self.content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ignores_insertion_order() {
        let a = Document::new("x").with_meta("b", "2").with_meta("a", "1");
        let b = Document::new("x").with_meta("a", "1").with_meta("b", "2");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), Document::new("y").fingerprint());
    }

    #[test]
    fn blank_name_reads_as_none() {
        let doc = Document::new("x").with_meta(meta::NAME, "");
        assert_eq!(doc.name(), None);
        assert_eq!(doc.doc_type(), None);

        let doc = Document::new("x").with_doc_type(DocType::Parent);
        assert!(doc.is_parent());
    }
}
