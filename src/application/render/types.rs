use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of rendering one post body or home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    /// Final HTML: sanitised for free accounts, directives expanded.
    pub html: String,
    /// Plain-text summary for feeds and meta descriptions.
    pub excerpt: String,
}

/// Structured errors raised inside the pipeline stages. None of these escape
/// [`RenderPipeline::render`](super::RenderPipeline::render): each stage
/// degrades locally and logs instead.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("markdown rendering failed: {message}")]
    Markdown { message: String },
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("math rendering failed: {message}")]
    Math { message: String },
    #[error("sanitisation rejected content: {message}")]
    Sanitisation { message: String },
    #[error("document processing failed: {message}")]
    Document { message: String },
    #[error("template rendering failed: {message}")]
    Template { message: String },
}

/// Renders markdown for embedding inside another document (post listings
/// with `content:True`). Implementations never expand directives, which
/// rules out recursive embedding.
pub trait EmbeddedRenderer {
    fn render_embedded(&self, markdown: &str) -> String;
}

impl<F> EmbeddedRenderer for F
where
    F: Fn(&str) -> String,
{
    fn render_embedded(&self, markdown: &str) -> String {
        self(markdown)
    }
}
