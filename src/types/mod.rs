//! Core types for the assistant core.

mod chat;
mod content;
mod generation;
mod models;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ChatTurn, StreamEvent, TurnRole};
pub use content::{Content, FunctionCall, FunctionResponse, Part, Role};
pub use generation::{
    Candidate, FinishReason, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    UsageMetadata,
};
pub use models::{
    context_window, family_representative, find_model, model_family, ModelFamily, ModelSpec,
    MODEL_CATALOG,
};
