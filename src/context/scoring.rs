//! Relevance scoring signals for context selection.
//!
//! Four independent signals feed the hybrid score: recency, importance,
//! lexical (semantic) overlap, and structural (file reference) overlap.
//! All are cheap heuristics; none involve learned embeddings.

use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::GeminiResult;

/// Weight of the recency signal in the hybrid score.
pub const W_RECENCY: f64 = 0.2;
/// Weight of the importance signal in the hybrid score.
pub const W_IMPORTANCE: f64 = 0.4;
/// Weight of the semantic signal in the hybrid score.
pub const W_SEMANTIC: f64 = 0.3;
/// Weight of the structural signal in the hybrid score.
pub const W_STRUCTURAL: f64 = 0.1;

/// Age beyond which the recency signal bottoms out.
pub const MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Tokens that look like source file references. Forward-slash paths
/// qualify; a backslash path is simply not matched as a path token —
/// it fails the generic format check with no Windows-specific handling.
static FILE_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[A-Za-z0-9_\-./]+\.(?:rs|ts|tsx|js|jsx|py|go|java|kt|c|cc|cpp|h|hpp|cs|rb|php|swift|css|scss|html|vue|json|toml|yaml|yml|md|sql|sh)\b",
    )
    .expect("file path pattern is valid")
});

/// Estimates importance of a chunk relative to the current query.
///
/// The default is the length heuristic below; a local-model estimator
/// can be plugged in without touching the selection algorithm.
#[async_trait::async_trait]
pub trait ImportanceEstimator: Send + Sync {
    /// Importance of `content` for answering `query`, in `[0, 1]`.
    async fn importance(&self, content: &str, query: &str) -> GeminiResult<f64>;
}

/// Length-based importance: long turns carry more signal.
pub fn heuristic_importance(text: &str) -> f64 {
    if text.len() > 100 {
        0.7
    } else {
        0.3
    }
}

/// Recency: `max(0, 1 - age / MAX_AGE)`.
pub fn recency_score(age: Duration) -> f64 {
    (1.0 - age.as_secs_f64() / MAX_AGE.as_secs_f64()).max(0.0)
}

/// Semantic: Jaccard similarity of the two texts' lowercase word sets,
/// counting only words longer than three characters.
pub fn semantic_score(chunk_text: &str, message: &str) -> f64 {
    let a = word_set(chunk_text);
    let b = word_set(message);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;
    intersection / union
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(String::from)
        .collect()
}

/// Structural: the fraction of file references in the current message
/// that the chunk also mentions. A message that references no files
/// scores every chunk at a neutral 0.5.
pub fn structural_score(chunk_text: &str, message: &str) -> f64 {
    let referenced: Vec<&str> = FILE_PATH_RE
        .find_iter(message)
        .map(|m| m.as_str())
        .collect();

    if referenced.is_empty() {
        return 0.5;
    }

    let mentioned = referenced
        .iter()
        .filter(|path| chunk_text.contains(*path))
        .count() as f64;
    mentioned / referenced.len() as f64
}

/// Combines the four signals into the hybrid score.
pub fn hybrid_score(recency: f64, importance: f64, semantic: f64, structural: f64) -> f64 {
    W_RECENCY * recency + W_IMPORTANCE * importance + W_SEMANTIC * semantic + W_STRUCTURAL * structural
}
