//! Match scoring — pluggable, trait-based scorer that measures resume text vs
//! a job description.
//!
//! Default: `TfidfScorer` (pure-Rust, fast, deterministic, fully testable).
//! Both documents are vectorized over a shared vocabulary built from just the
//! two of them, weighted with smoothed IDF, and compared by cosine similarity.
//!
//! `AppState` holds an `Arc<dyn MatchScorer>`, swapped at startup if needed.

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::ranking::stopwords::is_stop_word;

/// Vocabulary cap per scored pair. Rarest terms are dropped first.
const MAX_VOCABULARY_TERMS: usize = 1000;

/// Tokens shorter than this carry no signal and are discarded.
const MIN_TOKEN_CHARS: usize = 2;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("no scorable terms survived tokenization and stop-word removal")]
    EmptyVocabulary,
    #[error("document vector has zero magnitude, cosine similarity undefined")]
    ZeroMagnitude,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The match scorer trait. Implement this to swap scoring backends without
/// touching the rerank coordinator or handlers.
///
/// Scoring is synchronous: the rerank coordinator calls it from inside a
/// database transaction and must not yield while rows are locked.
pub trait MatchScorer: Send + Sync {
    /// Scores how well `resume_text` matches `job_description` on 0..=100,
    /// rounded to two decimals.
    ///
    /// An empty document on either side is a valid request and scores 0.0.
    fn score(&self, job_description: &str, resume_text: &str) -> Result<f64, ScoreError>;

    /// Degraded entry point used by the pipeline: a scoring failure is logged
    /// and collapsed to 0.0 so one bad document never stalls a rerank.
    fn score_or_zero(&self, job_description: &str, resume_text: &str) -> f64 {
        match self.score(job_description, resume_text) {
            Ok(score) => score,
            Err(error) => {
                warn!("match scoring degraded to 0.0: {error}");
                0.0
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TfidfScorer — default implementation
// ────────────────────────────────────────────────────────────────────────────

/// Pure-Rust TF-IDF scorer. Deterministic: the same pair of documents always
/// produces the same score, bit for bit.
///
/// Algorithm:
/// 1. Tokenize both documents: lowercase, split on non-alphanumerics, drop
///    tokens under two characters and English stop words.
/// 2. Build one shared vocabulary, highest combined frequency first
///    (alphabetical on ties), capped at `MAX_VOCABULARY_TERMS`.
/// 3. Weight each document as term-frequency × smoothed IDF over the
///    two-document corpus.
/// 4. Score = cosine(job, resume) × 100, rounded to two decimals.
pub struct TfidfScorer {
    max_terms: usize,
}

impl TfidfScorer {
    pub fn new() -> Self {
        Self {
            max_terms: MAX_VOCABULARY_TERMS,
        }
    }

    #[cfg(test)]
    fn with_max_terms(max_terms: usize) -> Self {
        Self { max_terms }
    }
}

impl Default for TfidfScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchScorer for TfidfScorer {
    fn score(&self, job_description: &str, resume_text: &str) -> Result<f64, ScoreError> {
        if job_description.is_empty() || resume_text.is_empty() {
            return Ok(0.0);
        }
        compute_tfidf_score(job_description, resume_text, self.max_terms)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core TF-IDF algorithm
// ────────────────────────────────────────────────────────────────────────────

struct VocabularyTerm {
    text: String,
    idf: f64,
}

fn compute_tfidf_score(
    job_description: &str,
    resume_text: &str,
    max_terms: usize,
) -> Result<f64, ScoreError> {
    let job_counts = term_counts(job_description);
    let resume_counts = term_counts(resume_text);

    let vocabulary = build_vocabulary(&job_counts, &resume_counts, max_terms);
    if vocabulary.is_empty() {
        return Err(ScoreError::EmptyVocabulary);
    }

    let job_vector = weighted_vector(&vocabulary, &job_counts);
    let resume_vector = weighted_vector(&vocabulary, &resume_counts);

    let similarity = cosine(&job_vector, &resume_vector)?;
    Ok(round2(similarity * 100.0))
}

/// Counts scorable terms in one document.
fn term_counts(text: &str) -> HashMap<String, u32> {
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.chars().count() < MIN_TOKEN_CHARS || is_stop_word(token) {
            continue;
        }
        *counts.entry(token.to_string()).or_insert(0u32) += 1;
    }
    counts
}

/// Merges both documents' terms into one fixed-order vocabulary.
///
/// Order is combined frequency descending, then alphabetical. The order is
/// part of the determinism contract: vectors are always summed the same way.
fn build_vocabulary(
    job_counts: &HashMap<String, u32>,
    resume_counts: &HashMap<String, u32>,
    max_terms: usize,
) -> Vec<VocabularyTerm> {
    let mut combined: HashMap<&str, u32> = HashMap::new();
    for (term, count) in job_counts {
        *combined.entry(term).or_insert(0) += count;
    }
    for (term, count) in resume_counts {
        *combined.entry(term).or_insert(0) += count;
    }

    let mut ordered: Vec<(&str, u32)> = combined.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ordered.truncate(max_terms);

    ordered
        .into_iter()
        .map(|(term, _)| {
            let document_frequency = u8::from(job_counts.contains_key(term))
                + u8::from(resume_counts.contains_key(term));
            VocabularyTerm {
                text: term.to_string(),
                idf: smooth_idf(document_frequency),
            }
        })
        .collect()
}

/// Smoothed inverse document frequency over the two-document corpus.
fn smooth_idf(document_frequency: u8) -> f64 {
    let corpus_size = 2.0;
    ((1.0 + corpus_size) / (1.0 + f64::from(document_frequency))).ln() + 1.0
}

fn weighted_vector(vocabulary: &[VocabularyTerm], counts: &HashMap<String, u32>) -> Vec<f64> {
    vocabulary
        .iter()
        .map(|term| {
            let tf = counts.get(&term.text).copied().unwrap_or(0);
            f64::from(tf) * term.idf
        })
        .collect()
}

fn cosine(a: &[f64], b: &[f64]) -> Result<f64, ScoreError> {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(ScoreError::ZeroMagnitude);
    }
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
