//! Chunked JSON parsing for streamed generation responses.
//!
//! The backend streams a JSON array with one response object per
//! element:
//! ```json
//! [{"candidates":[...],"usageMetadata":...},
//! {"candidates":[...],"usageMetadata":...}]
//! ```
//! Objects may be split across transport chunks; the parser buffers
//! partial data and extracts complete objects by brace matching.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::Stream;

use crate::error::{GeminiError, ResponseError};
use crate::types::GenerateContentResponse;

/// Parser for the backend's chunked JSON streaming format.
///
/// Handles complete objects in one chunk, objects split across chunks,
/// array brackets and comma separators, escaped characters inside
/// strings, nested structures, empty streams, and interruptions.
pub struct ChunkParser {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, GeminiError>> + Send>>,
    buffer: String,
    finished: bool,
    error: Option<GeminiError>,
}

impl ChunkParser {
    /// Create a new chunk parser from a byte stream.
    pub fn new(inner: Pin<Box<dyn Stream<Item = Result<Bytes, GeminiError>> + Send>>) -> Self {
        Self {
            inner,
            buffer: String::new(),
            finished: false,
            error: None,
        }
    }

    /// Feed data to the parser and extract complete response objects.
    ///
    /// Used internally by the `Stream` implementation; exposed for
    /// direct use in tests.
    pub fn feed(&mut self, data: &str) -> Vec<Result<GenerateContentResponse, GeminiError>> {
        self.buffer.push_str(data);
        let mut results = Vec::new();

        loop {
            match self.try_extract_object() {
                Some(Ok(obj)) => results.push(Ok(obj)),
                Some(Err(e)) => {
                    results.push(Err(e.clone()));
                    self.error = Some(e);
                    break;
                }
                None => break,
            }
        }

        results
    }

    /// Try to extract one complete JSON object from the buffer.
    fn try_extract_object(&mut self) -> Option<Result<GenerateContentResponse, GeminiError>> {
        self.skip_whitespace_and_delimiters();

        if self.buffer.is_empty() {
            return None;
        }

        if self.buffer.starts_with('[') {
            self.buffer.remove(0);
            return self.try_extract_object();
        }

        if self.buffer.starts_with(']') {
            self.buffer.remove(0);
            return None;
        }

        if let Some((json_str, remaining)) = extract_json_object(&self.buffer) {
            let parsed = serde_json::from_str::<GenerateContentResponse>(json_str)
                .map_err(|e| {
                    GeminiError::Response(ResponseError::MalformedChunk {
                        message: format!("failed to parse chunk: {}", e),
                    })
                });
            self.buffer = remaining.to_string();
            Some(parsed)
        } else {
            None // incomplete object, wait for more data
        }
    }

    fn skip_whitespace_and_delimiters(&mut self) {
        while let Some(c) = self.buffer.chars().next() {
            if c.is_whitespace() || c == ',' {
                self.buffer.remove(0);
            } else {
                break;
            }
        }
    }

    /// Parse any final buffered data once the stream ends.
    pub fn flush(&mut self) -> Option<Result<GenerateContentResponse, GeminiError>> {
        self.skip_whitespace_and_delimiters();

        if self.buffer.is_empty() || self.buffer == "]" {
            return None;
        }

        self.try_extract_object()
    }

    /// Whether the parser has encountered an error.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Extract one complete JSON object from the beginning of the input.
///
/// Tracks brace/bracket depth, string boundaries, and escape sequences
/// so that JSON syntax inside string values is ignored. Returns the
/// object and the remaining input, or `None` when the object is still
/// incomplete.
fn extract_json_object(input: &str) -> Option<(&str, &str)> {
    if !input.starts_with('{') {
        return None;
    }

    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in input.as_bytes().iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' | b'[' if !in_string => depth += 1,
            b'}' | b']' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((&input[..=i], &input[i + 1..]));
                }
            }
            _ => {}
        }
    }

    None // incomplete object
}

impl Stream for ChunkParser {
    type Item = Result<GenerateContentResponse, GeminiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.has_error() {
            return Poll::Ready(None);
        }

        if let Some(result) = self.try_extract_object() {
            return Poll::Ready(Some(result));
        }

        if self.finished {
            return Poll::Ready(self.flush());
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => {
                if let Ok(text) = std::str::from_utf8(&bytes) {
                    self.buffer.push_str(text);
                } else {
                    let error = GeminiError::Response(ResponseError::MalformedChunk {
                        message: "invalid UTF-8 in stream".to_string(),
                    });
                    self.error = Some(error.clone());
                    return Poll::Ready(Some(Err(error)));
                }

                if let Some(result) = self.try_extract_object() {
                    Poll::Ready(Some(result))
                } else {
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            }
            Poll::Ready(Some(Err(e))) => {
                self.error = Some(e.clone());
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(self.flush())
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
