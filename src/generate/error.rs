use thiserror::Error;

/// Errors from the remote text-generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("environment variable {0} is not set")]
    MissingApiKey(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("service returned HTTP {status}: {snippet}")]
    Status { status: u16, snippet: String },
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
    #[error("service returned no text")]
    EmptyResponse,
    #[error("runtime unavailable: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Shorten a response body for error messages.
pub(crate) fn make_snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
