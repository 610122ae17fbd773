//! Term extraction and corpus-relative scoring.
//!
//! Candidate terms are taken from runs of content words (maximal sequences of
//! non-stopword tokens, broken at stopwords and punctuation). Each run
//! contributes its words plus hyphenated phrases, which stand in for noun
//! phrases without a POS tagger:
//!
//! - a run of 2–3 words → the whole run (`latency-budget`, `cache-miss-rate`),
//! - a longer run → every adjacent pair.
//!
//! Scoring: `tf × ln((N + 1) / df)`, with `df` defaulting to 1 for terms the
//! corpus never saw.

use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};

/// Words never used as label terms.
pub const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "of", "in", "on", "for", "to", "from", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "as", "at", "that", "this", "these", "those",
    "it", "its", "they", "them", "he", "she", "we", "you", "i", "my", "your", "our", "their",
    "not", "no", "yes", "if", "then", "than", "so", "such", "can", "could", "should", "would",
    "about", "into", "over", "under", "between", "within", "without", "across", "after", "before",
    "also", "more", "most", "much", "many", "some", "any", "each", "every", "other", "another",
];

const MIN_TERM_CHARS: usize = 3;
const MAX_PHRASE_WORDS: usize = 3;

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Lowercased words; everything except alphanumerics and `-` separates.
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|w| w.trim_matches('-').to_lowercase())
        .filter(|w| !w.is_empty())
}

fn is_content(word: &str) -> bool {
    !is_stopword(word) && word.chars().count() >= MIN_TERM_CHARS
}

/// Candidate label terms for one document, with repetition (tf counts them).
pub fn candidate_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut run: Vec<String> = Vec::new();

    let flush = |run: &mut Vec<String>, terms: &mut Vec<String>| {
        terms.extend(run.iter().cloned());
        match run.len() {
            0 | 1 => {}
            n if n <= MAX_PHRASE_WORDS => terms.push(run.join("-")),
            _ => terms.extend(run.windows(2).map(|w| w.join("-"))),
        }
        run.clear();
    };

    // Sentence punctuation ends a run even without a stopword in between.
    for segment in text.split(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '"')) {
        for word in words(segment) {
            if is_content(&word) {
                run.push(word);
            } else {
                flush(&mut run, &mut terms);
            }
        }
        flush(&mut run, &mut terms);
    }
    terms
}

// ============================================================================
// Corpus statistics
// ============================================================================

/// Document frequency of every candidate term over a whole corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusStats {
    df: HashMap<String, usize>,
    doc_count: usize,
}

impl CorpusStats {
    pub fn build<S: AsRef<str>>(docs: &[S]) -> Self {
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in docs {
            let unique: HashSet<String> = candidate_terms(doc.as_ref()).into_iter().collect();
            for term in unique {
                *df.entry(term).or_default() += 1;
            }
        }
        Self { df, doc_count: docs.len() }
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    /// Document frequency; unseen terms count as 1.
    pub fn df(&self, term: &str) -> usize {
        self.df.get(term).copied().unwrap_or(1).max(1)
    }

    pub fn idf(&self, term: &str) -> f64 {
        ((self.doc_count as f64 + 1.0) / self.df(term) as f64).ln()
    }

    /// Terms of `docs` scored against this corpus, best first.
    /// Equal scores are ordered by term so the result is deterministic.
    pub fn score<S: AsRef<str>>(&self, docs: &[S]) -> Vec<(String, f64)> {
        let mut tf: BTreeMap<String, usize> = BTreeMap::new();
        for doc in docs {
            for term in candidate_terms(doc.as_ref()) {
                *tf.entry(term).or_default() += 1;
            }
        }
        let mut scored: Vec<(String, f64)> = tf
            .into_iter()
            .map(|(term, count)| {
                let s = count as f64 * self.idf(&term);
                (term, s)
            })
            .collect();
        // BTreeMap iteration already sorted by term; stable sort keeps that for ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

// ============================================================================
// Label selection
// ============================================================================

/// Label used when no term survives filtering.
pub const FALLBACK_LABEL: &str = "community";

fn squash(term: &str) -> String {
    term.chars().filter(|c| !c.is_whitespace() && *c != '-').collect::<String>().to_lowercase()
}

/// True if `term` is a substring or superstring of an already chosen term,
/// ignoring whitespace and hyphens.
pub fn is_redundant(term: &str, chosen: &[String]) -> bool {
    let t = squash(term);
    chosen.iter().any(|c| {
        let c = squash(c);
        t.contains(&c) || c.contains(&t)
    })
}

/// Digits, optionally hyphen-joined (`2024`, `2023-2024`).
fn is_numeric(term: &str) -> bool {
    term.chars().any(|c| c.is_ascii_digit()) && term.chars().all(|c| c.is_ascii_digit() || c == '-')
}

/// Label for one community's documents: the best `max_terms` distinctive
/// terms joined by `-`, cut to `max_len` characters. Never empty.
pub fn label_from_cluster_docs<S: AsRef<str>>(
    docs: &[S],
    corpus: &CorpusStats,
    max_terms: usize,
    max_len: usize,
) -> String {
    let mut chosen: Vec<String> = Vec::with_capacity(max_terms);
    for (term, _) in corpus.score(docs) {
        if chosen.len() >= max_terms {
            break;
        }
        if is_numeric(&term) || is_redundant(&term, &chosen) {
            continue;
        }
        chosen.push(term);
    }
    if chosen.is_empty() {
        return FALLBACK_LABEL.to_string();
    }
    let label: String = chosen.join("-").chars().take(max_len).collect();
    if label.is_empty() { FALLBACK_LABEL.to_string() } else { label }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_terms_runs_and_phrases() {
        let terms = candidate_terms("The cache miss rate rose.");
        assert!(terms.contains(&"cache".to_string()));
        assert!(terms.contains(&"cache-miss".to_string()), "{terms:?}");
        assert!(!terms.iter().any(|t| t == "the"));
    }

    #[test]
    fn test_short_and_stop_words_dropped() {
        let terms = candidate_terms("it is on an ox");
        assert!(terms.is_empty(), "{terms:?}");
    }

    #[test]
    fn test_long_run_yields_pairs() {
        let terms = candidate_terms("quantum error correction threshold theorem");
        assert!(terms.contains(&"quantum-error".to_string()));
        assert!(terms.contains(&"threshold-theorem".to_string()));
        assert!(!terms.iter().any(|t| t.matches('-').count() > 1));
    }

    #[test]
    fn test_unseen_terms_get_df_one() {
        let corpus = CorpusStats::build(&["alpha beta"]);
        assert_eq!(corpus.df("gamma"), 1);
        assert!((corpus.idf("gamma") - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_redundancy_filter() {
        let chosen = vec!["system".to_string()];
        assert!(is_redundant("systems", &chosen));
        assert!(is_redundant("sys-tem", &chosen));
        assert!(!is_redundant("latency", &chosen));
    }

    #[test]
    fn test_numeric_terms_skipped() {
        let doc = "2024, 2024, 2024, budget";
        let corpus = CorpusStats::build(&[doc]);
        assert_eq!(label_from_cluster_docs(&[doc], &corpus, 3, 48), "budget");
        assert!(is_numeric("2023-2024"));
    }

    #[test]
    fn test_fallback_label() {
        let corpus = CorpusStats::build(&["the a an"]);
        assert_eq!(label_from_cluster_docs(&["the a an"], &corpus, 3, 48), FALLBACK_LABEL);
        assert_eq!(label_from_cluster_docs::<&str>(&[], &corpus, 3, 48), FALLBACK_LABEL);
    }

    #[test]
    fn test_label_truncated_on_char_boundary() {
        let doc = "überlangeswortnummereins zweiteslangeswortimtext drittesganzlangeswortauch";
        let corpus = CorpusStats::build(&[doc]);
        let label = label_from_cluster_docs(&[doc], &corpus, 3, 48);
        assert_eq!(label.chars().count(), 48);
    }
}
