//! Retrieval-evaluation metrics over ranked output and relevance judgments.
//!
//! Aggregates are arithmetic means across the queries present in the ranked
//! results: an unjudged query contributes 0 to every metric but still counts
//! in the denominator. P@10 and R-precision require the full metric window
//! for judged queries and fail loudly when it is missing, since padding
//! short windows would corrupt the averages invisibly.

use anyhow::{ensure, Context, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::index::DocId;

/// Retrieved documents per query, in rank order.
pub type RankedResults = BTreeMap<String, Vec<DocId>>;
/// Binary relevant-document sets per query.
pub type Judgments = HashMap<String, HashSet<DocId>>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    pub precision: f64,
    pub recall: f64,
    pub p_at_10: f64,
    pub r_precision: f64,
    pub map: f64,
    pub bpref: f64,
}

/// Parse a ranked-results file: whitespace-delimited
/// `queryId rank docId score` lines, reordered by rank within each query.
pub fn read_ranked_results(path: &Path) -> Result<RankedResults> {
    let f = File::open(path)
        .with_context(|| format!("opening ranked results file {}", path.display()))?;
    let mut by_query: BTreeMap<String, Vec<(u32, DocId)>> = BTreeMap::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        ensure!(
            fields.len() >= 3,
            "malformed ranked-results line {}: {line:?}",
            lineno + 1
        );
        let rank: u32 = fields[1]
            .parse()
            .with_context(|| format!("bad rank on line {}: {line:?}", lineno + 1))?;
        by_query
            .entry(fields[0].to_string())
            .or_default()
            .push((rank, fields[2].to_string()));
    }
    let mut results = RankedResults::new();
    for (query_id, mut entries) in by_query {
        entries.sort_by_key(|(rank, _)| *rank);
        results.insert(query_id, entries.into_iter().map(|(_, doc)| doc).collect());
    }
    Ok(results)
}

/// Parse a relevance-judgment file: whitespace-delimited
/// `queryId <ignored> docId [grade]` lines. The grade column is discarded;
/// every listed document counts as relevant.
pub fn read_judgments(path: &Path) -> Result<Judgments> {
    let f =
        File::open(path).with_context(|| format!("opening judgments file {}", path.display()))?;
    let mut judgments = Judgments::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        ensure!(
            fields.len() >= 3,
            "malformed judgment line {}: {line:?}",
            lineno + 1
        );
        judgments
            .entry(fields[0].to_string())
            .or_default()
            .insert(fields[2].to_string());
    }
    Ok(judgments)
}

fn hits(retrieved: &[DocId], relevant: &HashSet<DocId>) -> usize {
    retrieved.iter().filter(|d| relevant.contains(*d)).count()
}

/// Fraction of retrieved documents that are relevant.
pub fn precision(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if retrieved.is_empty() {
        return 0.0;
    }
    hits(retrieved, relevant) as f64 / retrieved.len() as f64
}

/// Fraction of relevant documents that were retrieved.
pub fn recall(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits(retrieved, relevant) as f64 / relevant.len() as f64
}

/// Precision over the first ten ranks. Errors when fewer than ten documents
/// were retrieved.
pub fn p_at_10(retrieved: &[DocId], relevant: &HashSet<DocId>) -> Result<f64> {
    ensure!(
        retrieved.len() >= 10,
        "P@10 needs 10 retrieved documents, got {}",
        retrieved.len()
    );
    Ok(hits(&retrieved[..10], relevant) as f64 / 10.0)
}

/// Precision at rank `|relevant|`. Errors when fewer documents were
/// retrieved than there are relevant documents.
pub fn r_precision(retrieved: &[DocId], relevant: &HashSet<DocId>) -> Result<f64> {
    let r = relevant.len();
    if r == 0 {
        return Ok(0.0);
    }
    ensure!(
        retrieved.len() >= r,
        "R-precision needs {r} retrieved documents, got {}",
        retrieved.len()
    );
    Ok(hits(&retrieved[..r], relevant) as f64 / r as f64)
}

/// Average precision: at each relevant hit, precision so far; summed and
/// divided by the number of relevant documents.
pub fn average_precision(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut correct = 0u32;
    let mut sum = 0.0;
    for (i, doc_id) in retrieved.iter().enumerate() {
        if relevant.contains(doc_id) {
            correct += 1;
            sum += f64::from(correct) / (i as f64 + 1.0);
        }
    }
    sum / relevant.len() as f64
}

/// Binary preference. `R` is the number of relevant documents retrieved;
/// each relevant hit contributes `1 - nonRelevantSeen / R`, with the
/// non-relevant counter capped at `R`. 0 when `R = 0`.
pub fn bpref(retrieved: &[DocId], relevant: &HashSet<DocId>) -> f64 {
    let r = hits(retrieved, relevant);
    if r == 0 {
        return 0.0;
    }
    let mut non_relevant = 0usize;
    let mut sum = 0.0;
    for doc_id in retrieved {
        if relevant.contains(doc_id) {
            sum += 1.0 - non_relevant as f64 / r as f64;
        } else if non_relevant < r {
            non_relevant += 1;
        }
    }
    sum / r as f64
}

/// Mean the six metrics over every query in `results`.
///
/// The divisor is the number of result queries: a query without judgments
/// contributes 0 across the board rather than being skipped or erroring.
pub fn evaluate(results: &RankedResults, judgments: &Judgments) -> Result<Metrics> {
    ensure!(!results.is_empty(), "no ranked results to evaluate");

    let mut acc = Metrics::default();
    for (query_id, retrieved) in results {
        if let Some(relevant) = judgments.get(query_id) {
            acc.precision += precision(retrieved, relevant);
            acc.recall += recall(retrieved, relevant);
            acc.p_at_10 +=
                p_at_10(retrieved, relevant).with_context(|| format!("query {query_id}"))?;
            acc.r_precision +=
                r_precision(retrieved, relevant).with_context(|| format!("query {query_id}"))?;
            acc.map += average_precision(retrieved, relevant);
            acc.bpref += bpref(retrieved, relevant);
        }
    }

    let n = results.len() as f64;
    Ok(Metrics {
        precision: acc.precision / n,
        recall: acc.recall / n,
        p_at_10: acc.p_at_10 / n,
        r_precision: acc.r_precision / n,
        map: acc.map / n,
        bpref: acc.bpref / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const EPS: f64 = 1e-9;

    fn docs(ids: &[&str]) -> Vec<DocId> {
        ids.iter().map(|d| d.to_string()).collect()
    }

    fn set(ids: &[&str]) -> HashSet<DocId> {
        ids.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn precision_recall_rprecision_scenario() {
        let retrieved = docs(&["docA", "docC", "docB"]);
        let relevant = set(&["docA", "docB"]);
        assert!((precision(&retrieved, &relevant) - 2.0 / 3.0).abs() < EPS);
        assert!((recall(&retrieved, &relevant) - 1.0).abs() < EPS);
        assert!((r_precision(&retrieved, &relevant).unwrap() - 0.5).abs() < EPS);
    }

    #[test]
    fn average_precision_walks_rank_order() {
        let retrieved = docs(&["docA", "docC", "docB"]);
        let relevant = set(&["docA", "docB"]);
        // Hits at rank 1 (1/1) and rank 3 (2/3), over 2 relevant docs.
        assert!((average_precision(&retrieved, &relevant) - 5.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn bpref_counts_non_relevant_before_each_hit() {
        let retrieved = docs(&["docA", "docC", "docB"]);
        let relevant = set(&["docA", "docB"]);
        // R = 2; docA: 1 - 0/2, docB: 1 - 1/2; sum 1.5 over 2.
        assert!((bpref(&retrieved, &relevant) - 0.75).abs() < EPS);
    }

    #[test]
    fn bpref_caps_non_relevant_counter() {
        let retrieved = docs(&["x1", "x2", "x3", "docA"]);
        let relevant = set(&["docA"]);
        // R = 1; the counter stops at 1 before the hit, so docA adds 0.
        let value = bpref(&retrieved, &relevant);
        assert!(value.abs() < EPS);
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn empty_relevant_set_yields_zero_not_error() {
        let retrieved = docs(&["d1", "d2"]);
        let relevant = set(&[]);
        assert_eq!(recall(&retrieved, &relevant), 0.0);
        assert_eq!(average_precision(&retrieved, &relevant), 0.0);
        assert_eq!(bpref(&retrieved, &relevant), 0.0);
        assert_eq!(r_precision(&retrieved, &relevant).unwrap(), 0.0);
    }

    #[test]
    fn short_windows_fail_loudly() {
        let relevant = set(&["d1", "d2"]);
        assert!(p_at_10(&docs(&["d1", "d2", "d3"]), &relevant).is_err());
        assert!(r_precision(&docs(&["d1"]), &relevant).is_err());
    }

    #[test]
    fn evaluate_means_over_result_queries() {
        // q1: ten retrieved, relevant at ranks 1 and 3.
        let retrieved = docs(&[
            "d01", "d02", "d03", "d04", "d05", "d06", "d07", "d08", "d09", "d10",
        ]);
        let mut results = RankedResults::new();
        results.insert("q1".to_string(), retrieved);
        let mut judgments = Judgments::new();
        judgments.insert("q1".to_string(), set(&["d01", "d03"]));

        let m = evaluate(&results, &judgments).unwrap();
        assert!((m.precision - 0.2).abs() < EPS);
        assert!((m.recall - 1.0).abs() < EPS);
        assert!((m.p_at_10 - 0.2).abs() < EPS);
        assert!((m.r_precision - 0.5).abs() < EPS);
        assert!((m.map - 5.0 / 6.0).abs() < EPS);
        assert!((m.bpref - 0.75).abs() < EPS);
    }

    #[test]
    fn unjudged_query_contributes_zero_to_every_mean() {
        let retrieved = docs(&[
            "d01", "d02", "d03", "d04", "d05", "d06", "d07", "d08", "d09", "d10",
        ]);
        let mut results = RankedResults::new();
        results.insert("q1".to_string(), retrieved);
        // q2 is short and unjudged; it must neither error nor be skipped.
        results.insert("q2".to_string(), docs(&["dX"]));
        let mut judgments = Judgments::new();
        judgments.insert("q1".to_string(), set(&["d01", "d03"]));

        let m = evaluate(&results, &judgments).unwrap();
        assert!((m.precision - 0.1).abs() < EPS);
        assert!((m.recall - 0.5).abs() < EPS);
        assert!((m.map - 5.0 / 12.0).abs() < EPS);
    }

    #[test]
    fn judged_short_query_fails_the_aggregate() {
        let mut results = RankedResults::new();
        results.insert("q1".to_string(), docs(&["d1", "d2"]));
        let mut judgments = Judgments::new();
        judgments.insert("q1".to_string(), set(&["d1"]));
        assert!(evaluate(&results, &judgments).is_err());
    }

    #[test]
    fn ranked_results_reader_orders_by_rank() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "q1\t2\tdocB\t0.5").unwrap();
        writeln!(f, "q1\t1\tdocA\t0.9").unwrap();
        writeln!(f, "q2\t1\tdocC\t0.1").unwrap();
        let results = read_ranked_results(f.path()).unwrap();
        assert_eq!(results["q1"], docs(&["docA", "docB"]));
        assert_eq!(results["q2"], docs(&["docC"]));
    }

    #[test]
    fn judgments_reader_collapses_grades() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "q1 0 docA 1").unwrap();
        writeln!(f, "q1 0 docB 3").unwrap();
        writeln!(f, "q2 0 docA").unwrap();
        let judgments = read_judgments(f.path()).unwrap();
        assert_eq!(judgments["q1"], set(&["docA", "docB"]));
        assert_eq!(judgments["q2"], set(&["docA"]));
    }

    #[test]
    fn malformed_lines_are_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "q1 docA").unwrap();
        assert!(read_judgments(f.path()).is_err());
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "q1 notarank docA 0.5").unwrap();
        assert!(read_ranked_results(f.path()).is_err());
    }
}
