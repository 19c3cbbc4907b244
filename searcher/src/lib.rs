//! Corpus loading, index cache policy, and the two query front ends
//! (batch file runner and interactive prompt).

use anyhow::{ensure, Context, Result};
use okapi_core::bm25::{rank, Bm25Params};
use okapi_core::persist::{self, IndexPaths, MetaFile};
use okapi_core::tokenizer::normalize;
use okapi_core::Index;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Read every file in the top level of a collection directory. Contents are
/// lowercased, empty files are skipped, and the file name becomes the
/// document id.
pub fn read_corpus_dir(dir: &Path) -> Result<BTreeMap<String, String>> {
    let mut corpus = BTreeMap::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let doc_id = entry.file_name().to_string_lossy().to_string();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading document {}", path.display()))?
            .to_lowercase();
        if !text.is_empty() {
            corpus.insert(doc_id, text);
        }
    }
    ensure!(!corpus.is_empty(), "no documents found in {}", dir.display());
    Ok(corpus)
}

/// One stopword per line, blank lines ignored.
pub fn read_stopwords(path: &Path) -> Result<HashSet<String>> {
    let f =
        File::open(path).with_context(|| format!("opening stopword file {}", path.display()))?;
    let mut stopwords = HashSet::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        let word = line.trim();
        if !word.is_empty() {
            stopwords.insert(word.to_string());
        }
    }
    Ok(stopwords)
}

/// `queryId term term ...` lines; the raw query text is normalized later.
pub fn read_queries(path: &Path) -> Result<Vec<(String, String)>> {
    let f = File::open(path).with_context(|| format!("opening query file {}", path.display()))?;
    let mut queries = Vec::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        let mut fields = line.split_whitespace();
        if let Some(query_id) = fields.next() {
            let text = fields.collect::<Vec<_>>().join(" ");
            queries.push((query_id.to_string(), text));
        }
    }
    Ok(queries)
}

/// Load the persisted index if one exists, otherwise read the corpus, build
/// the index, persist it, and return it.
///
/// There is no invalidation: a persisted index shadows any later corpus
/// change until the index directory is deleted.
pub fn load_or_build_index(
    index_dir: &Path,
    corpus_dir: &Path,
    stopwords: &HashSet<String>,
) -> Result<Index> {
    let paths = IndexPaths::new(index_dir);
    if paths.exists() {
        return persist::load_index(&paths);
    }

    let corpus = read_corpus_dir(corpus_dir)?;
    let normalized: BTreeMap<String, Vec<String>> = corpus
        .iter()
        .map(|(doc_id, text)| (doc_id.clone(), normalize(text, stopwords)))
        .collect();
    let index = Index::build(&normalized)?;
    persist::save_index(&paths, &index)?;
    let meta = MetaFile {
        num_docs: index.num_docs,
        num_terms: index.terms.len() as u64,
        avg_doc_len: index.avg_doc_len,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: persist::FORMAT_VERSION,
    };
    persist::save_meta(&paths, &meta)?;
    tracing::info!(
        num_docs = index.num_docs,
        num_terms = index.terms.len(),
        "index build complete"
    );
    Ok(index)
}

/// Rank every query in the query file and write `queryId\trank\tdocId\tscore`
/// lines. Only strictly positive scores are emitted, and the rank counter
/// advances only for emitted lines.
pub fn run_batch(
    index: &Index,
    stopwords: &HashSet<String>,
    queries_path: &Path,
    output_path: &Path,
) -> Result<()> {
    let queries = read_queries(queries_path)?;
    let mut out = BufWriter::new(
        File::create(output_path)
            .with_context(|| format!("creating results file {}", output_path.display()))?,
    );
    for (query_id, text) in &queries {
        let terms = normalize(text, stopwords);
        let mut rank_number = 1u32;
        for (doc_id, score) in rank(&terms, index, Bm25Params::default()) {
            if score > 0.0 {
                writeln!(out, "{query_id}\t{rank_number}\t{doc_id}\t{score}")?;
                rank_number += 1;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Prompt loop: rank each typed query and print the top 15 documents as
/// `rank docId score`. `QUIT` (or end of input) exits.
pub fn run_interactive(index: &Index, stopwords: &HashSet<String>) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = String::new();
    loop {
        print!("Enter a query (or 'QUIT' to exit): ");
        std::io::stdout().flush()?;
        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let query = input.trim();
        if query == "QUIT" {
            break;
        }
        let terms = normalize(query, stopwords);
        let ranking = rank(&terms, index, Bm25Params::default());
        for (i, (doc_id, score)) in ranking.into_iter().take(15).enumerate() {
            println!("{} {} {}", i + 1, doc_id, score);
        }
    }
    Ok(())
}
