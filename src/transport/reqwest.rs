//! Reqwest-based HTTP transport implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use super::error::TransportError;
use super::http::{ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Reqwest-based HTTP transport.
///
/// The default timeout applies unless the request carries its own
/// override (the reliability layer's escalated timeouts arrive that
/// way).
pub struct ReqwestTransport {
    client: Client,
    default_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new reqwest transport.
    pub fn new(default_timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                TransportError::Connection(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            default_timeout,
        })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    fn convert_headers(headers: HashMap<String, String>) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, val);
            }
        }
        header_map
    }

    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn prepare(&self, request: HttpRequest) -> (reqwest::RequestBuilder, Duration) {
        let method = Self::convert_method(request.method);
        let headers = Self::convert_headers(request.headers);
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(headers)
            .timeout(timeout);

        if let Some(body) = request.body {
            builder = builder.body(body.to_vec());
        }

        (builder, timeout)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (builder, timeout) = self.prepare(request);

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let response_headers = Self::extract_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }

    async fn send_streaming(&self, request: HttpRequest) -> Result<ChunkedStream, TransportError> {
        let (builder, timeout) = self.prepare(request);

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Connection(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.bytes().await.map_err(|e| {
                TransportError::Request(format!("failed to read error response: {}", e))
            })?;
            return Err(TransportError::Request(format!(
                "HTTP error {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }

        let stream = response.bytes_stream();
        let mapped_stream = Box::pin(stream.map(|result| {
            result.map_err(|e| TransportError::Request(format!("stream error: {}", e)))
        }));

        Ok(mapped_stream)
    }
}
