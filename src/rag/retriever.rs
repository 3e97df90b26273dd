use std::sync::Arc;

use tracing::{debug, error};

use super::filter::{compress, redact, CONTEXT_SEPARATOR};
use super::index::KnowledgeIndex;
use super::query::QueryProfile;
use super::scoring::{parent_of, score_candidates, select_subjects, RetrievalConfig};
use crate::core::errors::ApiError;
use crate::document::{DocType, Document};

/// Hybrid keyword + semantic retriever producing a ready-to-prompt context.
#[derive(Clone)]
pub struct HybridRetriever {
    index: Arc<KnowledgeIndex>,
    config: RetrievalConfig,
}

impl HybridRetriever {
    pub fn new(index: Arc<KnowledgeIndex>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    /// Never fails: any error degrades to an empty context.
    pub async fn retrieve(&self, query: &str) -> String {
        match self.try_retrieve(query).await {
            Ok(context) => context,
            Err(err) => {
                error!("Retrieval error: {}", err);
                String::new()
            }
        }
    }

    async fn try_retrieve(&self, query: &str) -> Result<String, ApiError> {
        let profile = QueryProfile::analyze(query, &self.config.department_code);
        if profile.is_blank() {
            return Ok(String::new());
        }

        let documents = self.index.scan_all().await?;
        let mut parts = keyword_parts(&profile, &documents, &self.config);

        if profile.is_news_request || parts.is_empty() {
            let hits = self.index.search(query, self.config.semantic_k).await?;
            let added = merge_semantic_hits(&mut parts, hits, &documents);
            debug!("Added {} semantic results", added);
        }

        Ok(assemble_context(&profile, parts))
    }
}

/// Parent profiles of the selected subjects, in selection order.
pub fn keyword_parts(
    profile: &QueryProfile,
    documents: &[Document],
    config: &RetrievalConfig,
) -> Vec<String> {
    let candidates = score_candidates(profile, documents, config);
    select_subjects(profile, documents, candidates, config)
        .into_iter()
        .map(|idx| documents[idx].content.clone())
        .collect()
}

/// Appends semantic hits not already present. Child pointers are swapped for
/// their subject's parent profile, or dropped when the subject has none.
pub fn merge_semantic_hits(
    parts: &mut Vec<String>,
    hits: Vec<Document>,
    documents: &[Document],
) -> usize {
    let mut added = 0;
    for hit in hits {
        let content = if hit.doc_type() == Some(DocType::Child) {
            let Some(name) = hit.name() else {
                continue;
            };
            let idx = parent_of(documents, name, usize::MAX);
            match documents.get(idx) {
                Some(parent) => parent.content.clone(),
                None => continue,
            }
        } else {
            hit.content
        };

        if !parts.contains(&content) {
            parts.push(content);
            added += 1;
        }
    }
    added
}

/// Redacts every part, compresses targeted (non-list, non-news) lookups, and
/// joins the survivors.
pub fn assemble_context(profile: &QueryProfile, parts: Vec<String>) -> String {
    let cleaned = parts.iter().filter_map(|part| redact(part));
    let targeted = !profile.is_list_request && !profile.is_news_request;

    let finished: Vec<String> = if targeted {
        cleaned.map(|doc| compress(&doc, &profile.keywords)).collect()
    } else {
        cleaned.collect()
    };
    finished.join(CONTEXT_SEPARATOR)
}
