//! Accumulates streamed chunks into one complete response.

use crate::types::{ChatResponse, FinishReason, GenerateContentResponse, UsageMetadata};

/// Folds streaming chunks into a single `ChatResponse`.
///
/// Text deltas are concatenated in arrival order; usage metadata and
/// the finish reason come from the last chunk that carried them.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    usage: Option<UsageMetadata>,
    finish_reason: Option<FinishReason>,
    chunks: usize,
}

impl StreamAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one streamed chunk, returning the text delta it carried.
    pub fn add_chunk(&mut self, chunk: &GenerateContentResponse) -> String {
        let delta = chunk.text();
        self.text.push_str(&delta);

        if let Some(usage) = &chunk.usage_metadata {
            self.usage = Some(usage.clone());
        }
        if let Some(reason) = chunk.finish_reason() {
            self.finish_reason = Some(reason);
        }
        self.chunks += 1;

        delta
    }

    /// Number of chunks accumulated so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Finalizes into a complete response for the given model.
    pub fn finalize(self, model: &str) -> ChatResponse {
        ChatResponse {
            text: self.text,
            model: model.to_string(),
            usage: self.usage,
            finish_reason: self.finish_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> GenerateContentResponse {
        serde_json::from_str(&format!(
            r#"{{"candidates":[{{"content":{{"parts":[{{"text":"{text}"}}],"role":"model"}}}}]}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_accumulates_deltas_in_order() {
        let mut accumulator = StreamAccumulator::new();
        assert_eq!(accumulator.add_chunk(&chunk("Hello")), "Hello");
        assert_eq!(accumulator.add_chunk(&chunk(", world")), ", world");

        let response = accumulator.finalize("gemini-1.5-flash");
        assert_eq!(response.text, "Hello, world");
        assert_eq!(response.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_last_usage_and_finish_reason_win() {
        let mut accumulator = StreamAccumulator::new();
        accumulator.add_chunk(&chunk("partial"));

        let terminal: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": " done"}], "role": "model"}, "finishReason": "STOP"}
                ],
                "usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 2, "totalTokenCount": 9}
            }"#,
        )
        .unwrap();
        accumulator.add_chunk(&terminal);

        assert_eq!(accumulator.chunk_count(), 2);
        let response = accumulator.finalize("gemini-1.5-flash");
        assert_eq!(response.text, "partial done");
        assert_eq!(response.finish_reason, Some(FinishReason::Stop));
        assert_eq!(response.usage.unwrap().total_token_count, 9);
    }

    #[test]
    fn test_empty_stream_finalizes_empty() {
        let response = StreamAccumulator::new().finalize("gemini-1.5-flash");
        assert_eq!(response.text, "");
        assert!(response.usage.is_none());
    }
}
