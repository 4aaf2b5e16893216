//! Markdown rendering for blog posts and home pages.
//!
//! The pipeline is pure: a [`RenderContext`](crate::domain::context::RenderContext)
//! goes in, a [`RenderOutput`] comes out. Every stage recovers from bad input
//! locally, so callers never see an error.

pub mod directives;
mod excerpt;
mod pipeline;
pub mod preprocess;
mod sanitize;
mod service;
mod types;

pub use excerpt::{DEFAULT_EXCERPT_LENGTH, EXCERPT_SUFFIX, excerpt};
pub use pipeline::{
    RenderConfigError, RenderPipeline, RenderPipelineConfig, configure_render_pipeline,
    render_pipeline,
};
pub use preprocess::{escape_nested_parens, normalize_latex};
pub use sanitize::{DEFAULT_IFRAME_HOSTS, Sanitizer};
pub use service::MarkdownRenderer;
pub use service::hooks::{CodeBlock, LinkAttributes, MathStyle, RenderHooks, TextRewrite};
pub use types::{EmbeddedRenderer, RenderError, RenderOutput};
