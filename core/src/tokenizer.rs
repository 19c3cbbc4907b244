use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // One pass: drop everything that is neither a word character nor
    // whitespace, and drop digits.
    static ref STRIP: Regex = Regex::new(r"[^\w\s]|\d").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Normalize text into index terms: NFKC fold, lowercase, strip punctuation
/// and digits, split on whitespace, drop stopwords, stem the survivors.
pub fn normalize(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    normalize_with(text, stopwords, |w| STEMMER.stem(w).into_owned())
}

/// Same pipeline with a caller-supplied stemmer.
pub fn normalize_with<F>(text: &str, stopwords: &HashSet<String>, stem: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let stripped = STRIP.replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .filter(|w| !stopwords.contains(*w))
        .map(|w| stem(w))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_normalize() {
        let t = normalize("Running, runner's run!", &HashSet::new());
        assert!(t.iter().any(|w| w == "run"));
    }
}
