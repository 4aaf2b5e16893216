//! The renderer's override points.
//!
//! A [`RenderHooks`] value is a fixed capability set handed to the renderer:
//! one function per node kind the pipeline customises. The standard set
//! powers published content; the minimal set feeds excerpts.

use once_cell::sync::Lazy;
use regex::Regex;
use syntect::{html::ClassStyle, parsing::SyntaxSet};
use tracing::warn;

use crate::application::render::types::RenderError;
use crate::domain::slug::AnchorSlugger;
use crate::util::html::escape_html;

use super::{highlight, math};

/// Prefix marking a link that should open in a new tab: `[x](tab:https://…)`.
pub const NEW_TAB_PREFIX: &str = "tab:";

/// Attributes of an `<a>` element handed to the link hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkAttributes {
    pub href: String,
    pub title: Option<String>,
    pub target: Option<String>,
    pub rel: Option<String>,
}

/// What the text hook wants done with a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextRewrite {
    Unchanged,
    /// Replacement text, still escaped by the renderer.
    Text(String),
    /// Replacement markup, emitted verbatim.
    Html(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathStyle {
    Inline,
    Display,
}

/// Code hook inputs: language token, remaining info string, literal.
pub struct CodeBlock<'a> {
    pub language: Option<&'a str>,
    pub meta: Option<&'a str>,
    pub literal: &'a str,
}

#[derive(Clone, Copy)]
pub struct RenderHooks {
    /// Heading text to anchor id; `None` leaves the heading without an id.
    pub heading: fn(&str, &mut AnchorSlugger) -> Option<String>,
    pub link: fn(&mut LinkAttributes),
    pub text: fn(&str) -> TextRewrite,
    pub code: fn(&CodeBlock<'_>, &SyntaxSet, &ClassStyle) -> String,
    /// Errors are recovered by the renderer, which drops the fragment.
    pub math: fn(&str, MathStyle) -> Result<String, RenderError>,
}

impl RenderHooks {
    pub fn standard() -> Self {
        Self {
            heading: heading_anchor,
            link: open_in_new_tab,
            text: typographic_text,
            code: highlighted_code,
            math: katex_math,
        }
    }

    /// No anchors, highlighting or KaTeX: just enough markup to strip.
    pub fn minimal() -> Self {
        Self {
            heading: |_, _| None,
            link: |_| {},
            text: |_| TextRewrite::Unchanged,
            code: |block, _, _| highlight::plain_code_block(block.language, block.literal),
            math: |literal, _| Ok(escape_html(literal)),
        }
    }
}

impl Default for RenderHooks {
    fn default() -> Self {
        Self::standard()
    }
}

fn heading_anchor(text: &str, slugger: &mut AnchorSlugger) -> Option<String> {
    slugger.anchor_for(text).ok()
}

fn open_in_new_tab(link: &mut LinkAttributes) {
    if let Some(stripped) = link.href.strip_prefix(NEW_TAB_PREFIX) {
        link.href = stripped.to_string();
        link.target = Some("_blank".to_string());
        link.rel = Some(merge_rel(link.rel.as_deref(), &["noopener", "noreferrer"]));
    }

    if let Some(title) = link.title.as_mut() {
        *title = title.replace('"', "&quot;").replace('\'', "&#39;");
    }
}

fn merge_rel(existing: Option<&str>, required: &[&str]) -> String {
    let mut tokens: Vec<&str> = existing
        .unwrap_or_default()
        .split_whitespace()
        .collect();
    for token in required {
        if !tokens.contains(token) {
            tokens.push(token);
        }
    }
    tokens.join(" ")
}

static TYPOGRAPHY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((?:c|r|tm|p)\)|\+-").expect("typography pattern"));

static MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"==([^=\n]+)==").expect("mark pattern"));

fn typographic_text(text: &str) -> TextRewrite {
    if text.trim_end() == "\\" {
        return TextRewrite::Html("<br>".to_string());
    }

    let substituted = TYPOGRAPHY.replace_all(text, |caps: &regex::Captures<'_>| {
        match caps[0].to_ascii_lowercase().as_str() {
            "(c)" => "©",
            "(r)" => "®",
            "(tm)" => "™",
            "(p)" => "℗",
            _ => "±",
        }
    });

    if MARK.is_match(&substituted) {
        let escaped = escape_html(&substituted);
        let html = MARK.replace_all(&escaped, "<mark>$1</mark>");
        return TextRewrite::Html(html.into_owned());
    }

    if substituted == text {
        TextRewrite::Unchanged
    } else {
        TextRewrite::Text(substituted.into_owned())
    }
}

fn highlighted_code(block: &CodeBlock<'_>, syntax_set: &SyntaxSet, class_style: &ClassStyle) -> String {
    highlight::highlight_code(block.language, block.meta, block.literal, syntax_set, class_style)
        .unwrap_or_else(|err| {
            warn!(
                target = "application::render::highlight",
                error = %err,
                "highlighting failed; emitting plain code block"
            );
            highlight::plain_code_block(block.language, block.literal)
        })
}

fn katex_math(literal: &str, style: MathStyle) -> Result<String, RenderError> {
    let html = math::render_math_html(literal, style)?;
    Ok(if style == MathStyle::Display {
        format!("<div data-role=\"math-block\" data-math-style=\"display\">{html}</div>")
    } else {
        format!("<span data-role=\"math-inline\" data-math-style=\"inline\">{html}</span>")
    })
}
