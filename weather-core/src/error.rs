use thiserror::Error;

/// Failures raised by the HTTP layer and the response decoder.
///
/// Validation problems, unknown cities and missing location fixes are not
/// errors at this level; the orchestrator reports them as messages.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {}", truncate_body(.body))]
    Transport { status: u16, body: String },

    /// The status line arrived but reading the body failed.
    #[error("HTTP {status}: failed to read response body: {source}")]
    ResponseBody {
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    /// The body could not be decoded into the expected shape.
    #[error("Failed to parse weather response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No response was obtained (connect failure, timeout, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl WeatherError {
    /// HTTP status attached to the failure, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            WeatherError::Transport { status, .. } | WeatherError::ResponseBody { status, .. } => {
                Some(*status)
            }
            WeatherError::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type WeatherResult<T> = Result<T, WeatherError>;

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
