//! Okapi core: text normalization, inverted-index construction, BM25
//! ranking, and retrieval-evaluation metrics.

pub mod bm25;
pub mod eval;
pub mod index;
pub mod persist;
pub mod tokenizer;

pub use index::{DocId, Index, TermEntry};
