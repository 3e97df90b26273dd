//! Keyword scoring over document metadata and relative-threshold selection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::query::QueryProfile;
use crate::document::Document;

/// Tuning knobs for the hybrid retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Points per keyword found in a subject's name.
    pub name_weight: u32,
    /// Points per keyword found in a subject's department.
    pub dept_weight: u32,
    /// Candidates scoring below `max * relative_threshold` are discarded.
    pub relative_threshold: f64,
    /// Subject cap for non-list requests.
    pub max_subjects: usize,
    pub semantic_k: usize,
    /// Short keyword exempt from the minimum match length.
    pub department_code: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            name_weight: 200,
            dept_weight: 100,
            relative_threshold: 0.5,
            max_subjects: 3,
            semantic_k: 5,
            department_code: "r&d".to_string(),
        }
    }
}

const MIN_MATCH_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub index: usize,
    pub score: u32,
}

fn counts_against(keyword: &str, field: &str, department_code: &str) -> bool {
    !field.is_empty()
        && field.contains(keyword)
        && (keyword.chars().count() >= MIN_MATCH_CHARS || keyword == department_code)
}

/// Scores every document; only positive scores are returned, in document order.
pub fn score_candidates(
    profile: &QueryProfile,
    documents: &[Document],
    config: &RetrievalConfig,
) -> Vec<ScoredCandidate> {
    documents
        .iter()
        .enumerate()
        .filter_map(|(index, doc)| {
            let name = doc.name().unwrap_or("").to_lowercase();
            let dept = doc.dept().unwrap_or("").to_lowercase();

            // News queries only consider subjects actually named in the query.
            if profile.is_news_request
                && !profile.non_calendar_keywords().any(|k| name.contains(k))
            {
                return None;
            }

            let name_hits = profile
                .keywords
                .iter()
                .filter(|k| counts_against(k, &name, &config.department_code))
                .count() as u32;
            let dept_hits = profile
                .keywords
                .iter()
                .filter(|k| counts_against(k, &dept, &config.department_code))
                .count() as u32;

            let score = name_hits * config.name_weight + dept_hits * config.dept_weight;
            (score > 0).then_some(ScoredCandidate { index, score })
        })
        .collect()
}

/// Sorts best-first (stable, so ties keep document order) and drops everything
/// below `threshold` times the best score.
pub fn apply_relative_threshold(
    mut candidates: Vec<ScoredCandidate>,
    threshold: f64,
) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.cmp(&a.score));
    let Some(max_score) = candidates.first().map(|c| c.score) else {
        return candidates;
    };
    let floor = f64::from(max_score) * threshold;
    candidates
        .into_iter()
        .take_while(|c| f64::from(c.score) >= floor)
        .collect()
}

/// Index of the subject's parent profile, or `fallback` when it has none.
pub fn parent_of(documents: &[Document], name: &str, fallback: usize) -> usize {
    documents
        .iter()
        .position(|doc| doc.name() == Some(name) && doc.is_parent())
        .unwrap_or(fallback)
}

/// Picks distinct subjects from the thresholded candidates, substituting
/// each subject's parent profile. Returns document indices in selection order.
pub fn select_subjects(
    profile: &QueryProfile,
    documents: &[Document],
    candidates: Vec<ScoredCandidate>,
    config: &RetrievalConfig,
) -> Vec<usize> {
    let mut seen_names: HashSet<&str> = HashSet::new();
    let mut selected = Vec::new();

    for candidate in apply_relative_threshold(candidates, config.relative_threshold) {
        if let Some(name) = documents[candidate.index].name() {
            if seen_names.insert(name) {
                selected.push(parent_of(documents, name, candidate.index));
            }
        }
        if !profile.is_list_request && selected.len() >= config.max_subjects {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{meta, DocType};

    fn person(name: &str, dept: &str, doc_type: DocType, content: &str) -> Document {
        Document::new(content)
            .with_meta(meta::NAME, name)
            .with_meta(meta::DEPT, dept)
            .with_doc_type(doc_type)
    }

    fn profile(q: &str) -> QueryProfile {
        QueryProfile::analyze(q, "r&d")
    }

    #[test]
    fn name_and_department_hits_are_weighted() {
        let docs = vec![
            person("nguyễn văn a", "kế toán", DocType::Parent, "A"),
            person("trần thị b", "kỹ thuật", DocType::Parent, "B"),
        ];
        let scored = score_candidates(&profile("nguyễn văn kế toán"), &docs, &RetrievalConfig::default());
        // "kế" is only two characters, so it never counts.
        assert_eq!(scored, vec![ScoredCandidate { index: 0, score: 500 }]);
    }

    #[test]
    fn department_code_matches_despite_length_rule() {
        let docs = vec![person("lê c", "r&d", DocType::Parent, "C")];
        let scored = score_candidates(&profile("danh sách r&d"), &docs, &RetrievalConfig::default());
        assert_eq!(scored[0].score, 100);
    }

    #[test]
    fn news_queries_skip_unnamed_subjects() {
        let docs = vec![person("nguyễn văn a", "hành chính", DocType::Parent, "A")];
        let config = RetrievalConfig::default();
        assert!(score_candidates(&profile("lịch nghỉ tết hành chính"), &docs, &config).is_empty());
        assert_eq!(
            score_candidates(&profile("lịch nghỉ của nguyễn"), &docs, &config)[0].score,
            200
        );
    }

    #[test]
    fn threshold_is_relative_to_best_score() {
        let candidates = vec![
            ScoredCandidate { index: 0, score: 100 },
            ScoredCandidate { index: 1, score: 400 },
            ScoredCandidate { index: 2, score: 200 },
            ScoredCandidate { index: 3, score: 199 },
        ];
        let kept: Vec<usize> = apply_relative_threshold(candidates, 0.5)
            .into_iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn child_match_resolves_to_parent_and_names_dedupe() {
        let docs = vec![
            person("nguyễn văn a", "kế toán", DocType::Child, "child A"),
            person("nguyễn văn a", "kế toán", DocType::Parent, "parent A"),
            person("nguyễn văn a", "kế toán", DocType::Child, "child A2"),
        ];
        let p = profile("nguyễn văn a");
        let config = RetrievalConfig::default();
        let picked = select_subjects(&p, &docs, score_candidates(&p, &docs, &config), &config);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn non_list_requests_are_capped() {
        let docs: Vec<Document> = (0..5)
            .map(|i| person(&format!("nguyễn {i}"), "kho", DocType::Parent, "x"))
            .collect();
        let config = RetrievalConfig::default();

        let single = profile("nguyễn");
        let picked = select_subjects(&single, &docs, score_candidates(&single, &docs, &config), &config);
        assert_eq!(picked, vec![0, 1, 2]);

        let list = profile("danh sách nguyễn");
        let picked = select_subjects(&list, &docs, score_candidates(&list, &docs, &config), &config);
        assert_eq!(picked.len(), 5);
    }
}
