//! Token budgeting for context selection.

use crate::error::{ConfigurationError, GeminiResult};
use crate::types::context_window;

/// Tokens held back for the system instruction.
pub const RESERVED_SYSTEM_TOKENS: u32 = 1_024;

/// Tokens held back for tool declarations and tool traffic.
pub const RESERVED_TOOL_TOKENS: u32 = 512;

/// Per-request token budget, derived from the target model.
///
/// Invariant: `available_for_context = max_prompt_tokens -
/// reserved_for_system - reserved_for_tools`, and the derivation fails
/// before any budgeting happens when that would be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Prompt tokens the model accepts.
    pub max_prompt_tokens: u32,
    /// Tokens reserved for the system instruction.
    pub reserved_for_system: u32,
    /// Tokens reserved for tool plumbing.
    pub reserved_for_tools: u32,
    /// Tokens left for conversation context.
    pub available_for_context: u32,
}

impl TokenBudget {
    /// Derives the budget for a model, optionally capping the window.
    ///
    /// A model whose window cannot cover the reservations is rejected
    /// here — a caller-visible configuration error, not a silent
    /// degradation.
    pub fn for_model(model_id: &str, max_tokens: Option<u32>) -> GeminiResult<Self> {
        let window = max_tokens.unwrap_or_else(|| context_window(model_id));
        let reserved = RESERVED_SYSTEM_TOKENS + RESERVED_TOOL_TOKENS;

        if window < reserved {
            return Err(ConfigurationError::ContextWindowTooSmall {
                model: model_id.to_string(),
                deficit: reserved - window,
            }
            .into());
        }

        Ok(Self {
            max_prompt_tokens: window,
            reserved_for_system: RESERVED_SYSTEM_TOKENS,
            reserved_for_tools: RESERVED_TOOL_TOKENS,
            available_for_context: window - reserved,
        })
    }
}

/// Cheap token estimate: roughly four characters per token, never zero
/// for non-empty text.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    (text.chars().count() as u32).div_ceil(4)
}
