use crate::index::{DocId, Index};
use std::cmp::Ordering;
use std::collections::HashMap;

/// BM25 tuning constants.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.0, b: 0.75 }
    }
}

/// Rank the collection against a normalized query.
///
/// Each query-term occurrence adds
/// `idf * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * doc_len / avg_doc_len))`
/// to every document with a non-zero frequency for that term; terms absent
/// from the index are skipped. Duplicate query terms contribute once per
/// occurrence. The result is sorted by descending score with an explicit
/// ascending-document-id tie-break so rankings are reproducible.
pub fn rank(query_terms: &[String], index: &Index, params: Bm25Params) -> Vec<(DocId, f64)> {
    let mut scores: HashMap<&str, f64> = HashMap::new();
    for term in query_terms {
        if let Some(entry) = index.terms.get(term) {
            for (doc_id, &tf) in &entry.postings {
                let doc_len = f64::from(index.doc_lengths.get(doc_id).copied().unwrap_or(0));
                let tf = f64::from(tf);
                let denom =
                    tf + params.k1 * (1.0 - params.b + params.b * doc_len / index.avg_doc_len);
                *scores.entry(doc_id.as_str()).or_insert(0.0) +=
                    entry.idf * (tf * (params.k1 + 1.0)) / denom;
            }
        }
    }

    let mut ranked: Vec<(DocId, f64)> = scores
        .into_iter()
        .map(|(doc_id, score)| (doc_id.to_string(), score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked
}
