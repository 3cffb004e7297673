use thiserror::Error;

/// Failures talking to the scoring service.
///
/// `Http` and `Transport` are fetch failures; `Parse` means the service answered with a
/// body we could not understand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("http {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Parse(String),
}

impl ServiceError {
    pub fn is_fetch(&self) -> bool {
        matches!(self, ServiceError::Http { .. } | ServiceError::Transport(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ServiceError::Parse(_))
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Parse(err.to_string())
    }
}
