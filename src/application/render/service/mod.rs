mod config;
mod highlight;
pub mod hooks;
mod math;
mod postprocess;
mod rewrite;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use once_cell::sync::Lazy;
use syntect::{dumps::from_uncompressed_data, html::ClassStyle, parsing::SyntaxSet};
use tracing::warn;

use crate::application::render::types::RenderError;

use self::hooks::RenderHooks;
use config::default_options;
use postprocess::finish_html;
use rewrite::{RewriteOutcome, rewrite_ast};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(|| {
    let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
    from_uncompressed_data(syntax_bytes).unwrap_or_else(|err| {
        warn!(
            target = "application::render::highlight",
            error = %err,
            "bundled syntax pack unreadable; using syntect defaults"
        );
        SyntaxSet::load_defaults_newlines()
    })
});

/// Syntax definitions shared by every renderer, loaded on first use.
pub(crate) fn syntax_set() -> &'static SyntaxSet {
    &SYNTAX_SET
}

/// Comrak-based markdown renderer with GitHub-flavoured extensions, KaTeX
/// math and Syntect highlighting emitting `syntax-` prefixed classes.
///
/// Raw HTML is passed through untouched; sanitisation is a separate stage.
pub struct MarkdownRenderer {
    options: comrak::Options<'static>,
    class_style: ClassStyle,
    hooks: RenderHooks,
}

impl MarkdownRenderer {
    pub fn new(hooks: RenderHooks) -> Self {
        Self {
            options: default_options(),
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
            hooks,
        }
    }

    pub fn standard() -> Self {
        Self::new(RenderHooks::standard())
    }

    pub fn minimal() -> Self {
        Self::new(RenderHooks::minimal())
    }

    pub fn hooks(&self) -> &RenderHooks {
        &self.hooks
    }

    /// Render markdown to HTML. Failures are logged and yield an empty string.
    pub fn render(&self, markdown: &str) -> String {
        self.try_render(markdown).unwrap_or_else(|err| {
            warn!(
                target = "application::render::markdown",
                error = %err,
                "markdown rendering failed"
            );
            String::new()
        })
    }

    pub fn try_render(&self, markdown: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let outcome = rewrite_stage(root, &self.hooks, &self.class_style);
        let rendered = render_html_stage(root, &self.options)?;
        finish_html(&rendered, &outcome.anchors, &self.hooks)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::standard()
    }
}

fn rewrite_stage<'a>(
    root: &'a AstNode<'a>,
    hooks: &RenderHooks,
    class_style: &ClassStyle,
) -> RewriteOutcome {
    rewrite_ast(root, hooks, syntax_set(), class_style)
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}
