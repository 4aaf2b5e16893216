use std::error::Error as StdError;

use thiserror::Error;

use crate::{config::LoadError, domain::error::DomainError, infra::error::InfraError};

/// Error chain flattened for display: the error itself, then each source.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn render(&self) -> String {
        self.messages.join(": caused by: ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for the CLI: 2 for bad input, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(_) | AppError::Validation(_) | AppError::Config(_) => 2,
            AppError::Infra(_) | AppError::Unexpected(_) => 1,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn report_walks_the_source_chain() {
        let io = std::io::Error::other("disk on fire");
        let error = AppError::from(InfraError::read_input(Path::new("post.md"), io));
        let report = error.report();
        assert_eq!(report.messages[0], "failed to read `post.md`");
        assert_eq!(report.messages.last().map(String::as_str), Some("disk on fire"));
        assert_eq!(report.render(), "failed to read `post.md`: caused by: disk on fire");
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn bad_input_exits_with_two() {
        assert_eq!(AppError::validation("nope").exit_code(), 2);
        assert_eq!(
            AppError::from(DomainError::invalid_context("missing blog")).exit_code(),
            2
        );
    }
}
