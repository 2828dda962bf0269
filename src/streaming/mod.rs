//! Streaming support for backend responses.
//!
//! The backend streams a JSON array of response objects; `ChunkParser`
//! extracts them as they arrive (buffering objects split across
//! transport chunks) and `StreamAccumulator` folds the deltas into a
//! complete response once the stream ends.

mod accumulator;
mod chunked_json;

pub use accumulator::StreamAccumulator;
pub use chunked_json::ChunkParser;
