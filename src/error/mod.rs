//! Error taxonomy for the assistant core.

mod categories;
mod mapper;
mod types;

pub use categories::*;
pub use mapper::{map_http_status_with_body, ApiErrorDetail, ApiErrorResponse};
pub use types::{GeminiError, GeminiResult};
