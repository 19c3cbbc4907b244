use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type DocId = String;

/// Per-term slice of the index: document frequency, BM25 idf, and the
/// posting map from document id to raw term frequency in that document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub df: u32,
    pub idf: f64,
    pub postings: HashMap<DocId, u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    pub terms: HashMap<String, TermEntry>,
    pub doc_lengths: HashMap<DocId, u32>,
    pub avg_doc_len: f64,
    pub num_docs: u32,
}

impl Index {
    /// Build the inverted index over normalized per-document token sequences.
    ///
    /// Document frequency counts each document at most once per term, however
    /// often the term repeats inside it; raw term frequencies are kept in the
    /// postings for scoring.
    pub fn build(documents: &BTreeMap<DocId, Vec<String>>) -> Result<Self> {
        ensure!(
            !documents.is_empty(),
            "refusing to build an index over an empty collection"
        );
        let num_docs = documents.len() as u32;

        let mut terms: HashMap<String, TermEntry> = HashMap::new();
        let mut doc_lengths: HashMap<DocId, u32> = HashMap::new();
        let mut total_len: u64 = 0;

        for (doc_id, tokens) in documents {
            let len = tokens.len() as u32;
            doc_lengths.insert(doc_id.clone(), len);
            total_len += u64::from(len);

            let mut tf: HashMap<&str, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, count) in tf {
                let entry = terms.entry(term.to_string()).or_insert_with(|| TermEntry {
                    df: 0,
                    idf: 0.0,
                    postings: HashMap::new(),
                });
                entry.df += 1;
                entry.postings.insert(doc_id.clone(), count);
            }
        }

        for entry in terms.values_mut() {
            entry.idf = idf(num_docs, entry.df);
        }
        let avg_doc_len = total_len as f64 / f64::from(num_docs);

        Ok(Self {
            terms,
            doc_lengths,
            avg_doc_len,
            num_docs,
        })
    }

    /// Every document id referenced by a posting must exist in the length
    /// table; scoring divides by per-document lengths.
    pub fn validate(&self) -> Result<()> {
        for (term, entry) in &self.terms {
            for doc_id in entry.postings.keys() {
                ensure!(
                    self.doc_lengths.contains_key(doc_id),
                    "posting for term {term:?} references unknown document {doc_id:?}"
                );
            }
        }
        Ok(())
    }
}

/// Classic BM25 inverse document frequency, `ln((N - df + 0.5) / (df + 0.5))`.
/// Negative for terms occurring in more than half the collection; deliberately
/// not clamped.
pub fn idf(num_docs: u32, df: u32) -> f64 {
    let n = f64::from(num_docs);
    let df = f64::from(df);
    ((n - df + 0.5) / (df + 0.5)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn df_counts_each_document_once() {
        let mut docs = BTreeMap::new();
        docs.insert("d1".to_string(), toks(&["cat", "cat", "cat"]));
        docs.insert("d2".to_string(), toks(&["cat", "dog"]));
        let index = Index::build(&docs).unwrap();
        assert_eq!(index.terms["cat"].df, 2);
        assert_eq!(index.terms["cat"].postings["d1"], 3);
        assert_eq!(index.terms["cat"].postings["d2"], 1);
        assert_eq!(index.terms["dog"].df, 1);
    }

    #[test]
    fn idf_matches_formula() {
        let expected = ((10.0 - 2.0 + 0.5_f64) / (2.0 + 0.5)).ln();
        assert!((idf(10, 2) - expected).abs() < 1e-12);
    }

    #[test]
    fn idf_goes_negative_for_common_terms() {
        // df = 3 of N = 4 -> ln(1.5 / 3.5)
        assert!(idf(4, 3) < 0.0);
    }

    #[test]
    fn average_length_spans_all_documents() {
        let mut docs = BTreeMap::new();
        docs.insert("d1".to_string(), toks(&["a", "b", "c"]));
        docs.insert("d2".to_string(), toks(&["a"]));
        let index = Index::build(&docs).unwrap();
        assert_eq!(index.num_docs, 2);
        assert_eq!(index.doc_lengths["d1"], 3);
        assert_eq!(index.doc_lengths["d2"], 1);
        assert!((index.avg_doc_len - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_collection_is_rejected() {
        let docs = BTreeMap::new();
        assert!(Index::build(&docs).is_err());
    }

    #[test]
    fn validate_catches_dangling_postings() {
        let mut docs = BTreeMap::new();
        docs.insert("d1".to_string(), toks(&["cat"]));
        let mut index = Index::build(&docs).unwrap();
        index.validate().unwrap();
        index.doc_lengths.remove("d1");
        assert!(index.validate().is_err());
    }
}
