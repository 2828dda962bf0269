//! HTTP transport layer for the assistant core.

pub mod endpoints;
mod error;
mod http;
mod request;
mod reqwest;
mod response;

pub use self::reqwest::ReqwestTransport;
pub use error::TransportError;
pub use http::{ChunkedStream, HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use request::RequestBuilder;
pub use response::ResponseParser;
