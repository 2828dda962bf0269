//! Endpoint path helpers for the Gemini generation API.

/// Base path for models endpoints.
pub const MODELS: &str = "/models";

/// Path for the generateContent endpoint of a model.
pub fn generate_content(model: &str) -> String {
    format!("{}/{}:generateContent", MODELS, model)
}

/// Path for the streamGenerateContent endpoint of a model.
pub fn stream_generate_content(model: &str) -> String {
    format!("{}/{}:streamGenerateContent", MODELS, model)
}
