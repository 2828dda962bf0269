//! Error mapping utilities for HTTP status codes and API responses.

use serde::Deserialize;

use super::categories::*;
use super::types::GeminiError;

/// Structured API error response body.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    /// The error payload.
    pub error: ApiErrorDetail,
}

/// Detailed error information from the API.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Numeric status code echoed by the API.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
    /// Canonical status string (e.g. "RESOURCE_EXHAUSTED").
    pub status: String,
}

/// Maps an HTTP status code and response body to a `GeminiError`.
///
/// Parses the structured error body when present and falls back to the
/// raw text otherwise, then maps to the most specific variant the
/// status and message allow.
pub fn map_http_status_with_body(status: u16, body: &[u8]) -> GeminiError {
    let (message, detail) =
        if let Ok(parsed) = serde_json::from_slice::<ApiErrorResponse>(body) {
            (parsed.error.message.clone(), Some(parsed.error))
        } else {
            (String::from_utf8_lossy(body).to_string(), None)
        };

    match status {
        400 => GeminiError::Request(RequestError::Validation { message }),

        401 => GeminiError::Authentication(AuthenticationError::InvalidApiKey),

        403 => {
            let lowered = message.to_lowercase();
            let status_says_quota = detail
                .as_ref()
                .map(|d| d.status.to_uppercase().contains("RESOURCE_EXHAUSTED"))
                .unwrap_or(false);
            if lowered.contains("quota") || status_says_quota {
                GeminiError::Authentication(AuthenticationError::QuotaExceeded)
            } else {
                GeminiError::Authentication(AuthenticationError::InvalidApiKey)
            }
        }

        404 => GeminiError::Resource(ResourceError::ModelNotFound {
            model: extract_model_name(&message),
        }),

        429 => GeminiError::RateLimit(RateLimitError::TooManyRequests {
            retry_after: None, // filled in from headers by the response parser
        }),

        500 => GeminiError::Server(ServerError::Internal { message }),

        503 => {
            if message.to_lowercase().contains("overload") {
                GeminiError::Server(ServerError::ModelOverloaded {
                    model: extract_model_name(&message),
                })
            } else {
                GeminiError::Server(ServerError::Unavailable {
                    retry_after: None, // filled in from headers by the response parser
                })
            }
        }

        _ => GeminiError::Unknown {
            message: format!("HTTP {}: {}", status, message),
        },
    }
}

/// Extracts a model name from an error message (simple heuristic).
fn extract_model_name(message: &str) -> String {
    if let Some(found) = message
        .split_whitespace()
        .find(|s| s.starts_with("models/"))
    {
        return found
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-' && c != '_' && c != '.')
            .trim_start_matches("models/")
            .to_string();
    }

    for quote in ['\'', '"'] {
        if let Some(start) = message.find(quote) {
            if let Some(end) = message[start + 1..].find(quote) {
                return message[start + 1..start + 1 + end].to_string();
            }
        }
    }

    "unknown".to_string()
}
