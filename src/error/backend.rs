use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid backend endpoint {url}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to build backend client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Template {template} expects {expected} parameters, row has {got}")]
    ParameterCount {
        template: String,
        expected: usize,
        got: usize,
    },
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("Transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("Backend returned status {status}")]
    Status { status: u16 },
}

impl BackendError {
    /// Stable short signature used as the outcome key in the final report.
    /// Distinct failure modes map to distinct keys; free-form error text
    /// never leaks into the key so the distribution stays bounded.
    #[must_use]
    pub fn signature(&self) -> String {
        match self {
            BackendError::InvalidEndpoint { .. } => "bad_endpoint".to_owned(),
            BackendError::BuildClient { .. } => "client_build".to_owned(),
            BackendError::ParameterCount { .. } => "bind_mismatch".to_owned(),
            BackendError::Timeout { .. } => "timeout".to_owned(),
            BackendError::Transport { .. } => "transport".to_owned(),
            BackendError::Status { status } => format!("http_{status}"),
        }
    }
}
