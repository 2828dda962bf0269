//! Context selection: turns an unbounded conversation history into a
//! token-bounded, relevance-ranked context window.
//!
//! Selection is hybrid-ranked but cheap — recency, a pluggable
//! importance estimate, lexical overlap, and file-reference overlap.
//! Ranking decides *inclusion* only; the returned context is always in
//! chronological order.

mod budget;
mod scoring;

pub use budget::{estimate_tokens, TokenBudget, RESERVED_SYSTEM_TOKENS, RESERVED_TOOL_TOKENS};
pub use scoring::{
    heuristic_importance, hybrid_score, recency_score, semantic_score, structural_score,
    ImportanceEstimator, MAX_AGE, W_IMPORTANCE, W_RECENCY, W_SEMANTIC, W_STRUCTURAL,
};

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use lru::LruCache;
use parking_lot::Mutex;

use crate::error::GeminiResult;
use crate::types::{ChatTurn, TurnRole};

/// Most recent turns always forwarded for conversational continuity,
/// regardless of their ranked relevance.
pub const MIN_CONTEXT_MESSAGES: usize = 2;

/// Capacity of the importance-score memo.
const IMPORTANCE_MEMO_SIZE: usize = 256;

/// A history turn lifted into the selection pipeline.
///
/// Chunks live only for the duration of one selection call; they are
/// never persisted.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    /// Originating turn id.
    pub id: u64,
    /// Who authored the turn.
    pub role: TurnRole,
    /// The turn's text payload.
    pub text: String,
    /// Wall-clock timestamp of the turn, ms since the epoch.
    pub timestamp_ms: u64,
    /// Estimated token cost, computed once at construction.
    pub tokens: u32,
    /// Combined relevance score.
    pub relevance: f64,
    /// Importance signal.
    pub importance: f64,
    /// Lexical overlap signal.
    pub semantic: f64,
    /// File-reference overlap signal.
    pub structural: f64,
}

impl ContextChunk {
    fn from_turn(turn: &ChatTurn) -> Self {
        let text = turn.text_content();
        let tokens = estimate_tokens(&text);
        Self {
            id: turn.id,
            role: turn.role,
            text,
            timestamp_ms: turn.timestamp_ms,
            tokens,
            relevance: 0.0,
            importance: 0.0,
            semantic: 0.0,
            structural: 0.0,
        }
    }
}

/// One selected context entry, in final chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSlice {
    /// Who authored the entry.
    pub role: TurnRole,
    /// The entry's text.
    pub text: String,
}

/// Selects the context window to send with a request.
pub struct ContextManager {
    estimator: Option<Arc<dyn ImportanceEstimator>>,
    importance_memo: Mutex<LruCache<u64, f64>>,
}

impl ContextManager {
    /// A manager using the length heuristic for importance.
    pub fn new() -> Self {
        Self {
            estimator: None,
            importance_memo: Mutex::new(LruCache::new(
                NonZeroUsize::new(IMPORTANCE_MEMO_SIZE).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// A manager backed by a pluggable importance estimator. The
    /// estimator is advisory: failures fall back to the heuristic.
    pub fn with_estimator(estimator: Arc<dyn ImportanceEstimator>) -> Self {
        Self {
            estimator: Some(estimator),
            ..Self::new()
        }
    }

    /// Extracts the minimal ranked context for a new message.
    ///
    /// Tool-call and tool-result turns are never forwarded — leaking
    /// tool payloads back into the prompt is a correctness bug, not a
    /// style choice. The two most recent qualifying turns are always
    /// included; the rest compete on the hybrid score for the remaining
    /// token budget.
    pub async fn extract_relevant_context(
        &self,
        history: &[ChatTurn],
        current_message: &str,
        model_id: &str,
        max_tokens: Option<u32>,
    ) -> GeminiResult<Vec<ContextSlice>> {
        let budget = TokenBudget::for_model(model_id, max_tokens)?;

        let mut candidates: Vec<ContextChunk> = history
            .iter()
            .filter(|turn| !turn.is_tool_turn())
            .map(ContextChunk::from_turn)
            .filter(|chunk| !chunk.text.trim().is_empty())
            .collect();
        candidates.sort_by_key(|c| (c.timestamp_ms, c.id));

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let reserved_from = candidates.len().saturating_sub(MIN_CONTEXT_MESSAGES);
        let mut scored: Vec<ContextChunk> = candidates.drain(..reserved_from).collect();
        let mut selected: Vec<ContextChunk> = candidates;
        for chunk in &mut selected {
            chunk.relevance = 1.0;
        }

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        // Score every remaining chunk concurrently; ranking latency is
        // bounded by the slowest single score, not their sum.
        let scores = join_all(scored.iter().map(|chunk| {
            let age = Duration::from_millis(now_ms.saturating_sub(chunk.timestamp_ms));
            async move {
                let importance = self.importance_of(&chunk.text, current_message).await;
                let recency = recency_score(age);
                let semantic = semantic_score(&chunk.text, current_message);
                let structural = structural_score(&chunk.text, current_message);
                (
                    importance,
                    recency,
                    semantic,
                    structural,
                    hybrid_score(recency, importance, semantic, structural),
                )
            }
        }))
        .await;

        for (chunk, (importance, _recency, semantic, structural, relevance)) in
            scored.iter_mut().zip(scores)
        {
            chunk.importance = importance;
            chunk.semantic = semantic;
            chunk.structural = structural;
            chunk.relevance = relevance;
        }

        // Highest score first; ties resolved toward newer turns.
        scored.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.timestamp_ms.cmp(&a.timestamp_ms))
        });

        let mut total: u32 = selected.iter().map(|c| c.tokens).sum();
        for chunk in scored {
            if total + chunk.tokens <= budget.available_for_context {
                total += chunk.tokens;
                selected.push(chunk);
            }
        }

        // Ranking chose the members; chronology dictates the order.
        selected.sort_by_key(|c| (c.timestamp_ms, c.id));

        Ok(selected
            .into_iter()
            .map(|c| ContextSlice {
                role: c.role,
                text: c.text,
            })
            .collect())
    }

    /// Importance of a chunk for the current query, memoized by
    /// content + query. Estimator failures degrade to the heuristic
    /// without failing the selection.
    async fn importance_of(&self, content: &str, query: &str) -> f64 {
        let Some(estimator) = &self.estimator else {
            return heuristic_importance(content);
        };

        let key = memo_key(content, query);
        if let Some(cached) = self.importance_memo.lock().get(&key).copied() {
            return cached;
        }

        match estimator.importance(content, query).await {
            Ok(value) => {
                let clamped = value.clamp(0.0, 1.0);
                self.importance_memo.lock().put(key, clamped);
                clamped
            }
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    "importance estimator unavailable, using length heuristic"
                );
                heuristic_importance(content)
            }
        }
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("has_estimator", &self.estimator.is_some())
            .finish()
    }
}

fn memo_key(content: &str, query: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    content.hash(&mut hasher);
    query.hash(&mut hasher);
    hasher.finish()
}
