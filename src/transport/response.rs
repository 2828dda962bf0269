//! HTTP response parser for the Gemini backend.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;

use super::http::HttpResponse;
use crate::error::{map_http_status_with_body, GeminiError, RateLimitError, ServerError};

/// Parser for HTTP responses from the backend: deserializes successes,
/// maps error statuses to the taxonomy, and lifts retry-after headers
/// into the mapped errors.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a response body into the expected type, or maps the
    /// error status to a `GeminiError`.
    pub fn parse_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T, GeminiError> {
        if (200..300).contains(&response.status) {
            let parsed: T = serde_json::from_slice(&response.body)?;
            Ok(parsed)
        } else {
            Err(Self::parse_error_response(response))
        }
    }

    /// Maps an error response to the taxonomy.
    pub fn parse_error_response(response: HttpResponse) -> GeminiError {
        let retry_after = Self::parse_retry_after(&response.headers);

        let mut error = map_http_status_with_body(response.status, &response.body);

        match &mut error {
            GeminiError::RateLimit(RateLimitError::TooManyRequests { retry_after: ra })
            | GeminiError::RateLimit(RateLimitError::QuotaExceeded { retry_after: ra })
            | GeminiError::Server(ServerError::Unavailable { retry_after: ra }) => {
                *ra = retry_after;
            }
            _ => {}
        }

        tracing::debug!(status = response.status, code = error.code(), "API error response");
        error
    }

    /// Parses the Retry-After header (seconds form) if present.
    pub fn parse_retry_after(headers: &HashMap<String, String>) -> Option<Duration> {
        headers.iter().find_map(|(key, value)| {
            if key.eq_ignore_ascii_case("retry-after") {
                value.parse::<u64>().ok().map(Duration::from_secs)
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthenticationError, RequestError, ResourceError};
    use bytes::Bytes;
    use serde::Deserialize;

    #[derive(Deserialize, Debug, PartialEq)]
    struct TestResponse {
        name: String,
        value: i32,
    }

    fn create_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_parse_successful_response() {
        let response = create_response(200, r#"{"name":"test","value":42}"#);
        let parsed: TestResponse = ResponseParser::parse_response(response).unwrap();

        assert_eq!(parsed.name, "test");
        assert_eq!(parsed.value, 42);
    }

    #[test]
    fn test_parse_400_validation_error() {
        let response = create_response(400, r#"{"error":{"code":400,"message":"Invalid request","status":"INVALID_ARGUMENT"}}"#);
        let error = ResponseParser::parse_response::<TestResponse>(response).unwrap_err();

        assert!(matches!(
            error,
            GeminiError::Request(RequestError::Validation { .. })
        ));
    }

    #[test]
    fn test_parse_401_auth_error() {
        let response = create_response(401, r#"{"error":{"code":401,"message":"Invalid API key","status":"UNAUTHENTICATED"}}"#);
        let error = ResponseParser::parse_response::<TestResponse>(response).unwrap_err();

        assert!(matches!(
            error,
            GeminiError::Authentication(AuthenticationError::InvalidApiKey)
        ));
    }

    #[test]
    fn test_parse_404_model_not_found() {
        let response = create_response(404, r#"{"error":{"code":404,"message":"models/gemini-fake was not found","status":"NOT_FOUND"}}"#);
        let error = ResponseParser::parse_response::<TestResponse>(response).unwrap_err();

        assert!(matches!(
            error,
            GeminiError::Resource(ResourceError::ModelNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_429_lifts_retry_after_header() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), "60".to_string());

        let response = HttpResponse {
            status: 429,
            headers,
            body: Bytes::from(r#"{"error":{"code":429,"message":"Too many requests","status":"RESOURCE_EXHAUSTED"}}"#),
        };

        let error = ResponseParser::parse_response::<TestResponse>(response).unwrap_err();
        assert_eq!(error.retry_after(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_retry_after_case_insensitive() {
        let mut headers = HashMap::new();
        headers.insert("Retry-After".to_string(), "30".to_string());

        assert_eq!(
            ResponseParser::parse_retry_after(&headers),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_parse_retry_after_missing() {
        assert_eq!(ResponseParser::parse_retry_after(&HashMap::new()), None);
    }
}
