use thiserror::Error;

/// Invalid render inputs supplied by the hosting application.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown account tier `{0}` (expected `free` or `upgraded`)")]
    UnknownTier(String),
    #[error("invalid render context: {message}")]
    InvalidContext { message: String },
}

impl DomainError {
    pub fn invalid_context(message: impl Into<String>) -> Self {
        Self::InvalidContext {
            message: message.into(),
        }
    }
}
