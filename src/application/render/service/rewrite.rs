use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use syntect::html::ClassStyle;
use syntect::parsing::SyntaxSet;
use tracing::warn;

use crate::domain::slug::AnchorSlugger;

use super::hooks::{CodeBlock, MathStyle, RenderHooks, TextRewrite};

#[derive(Debug, Default)]
pub(crate) struct RewriteOutcome {
    /// One entry per markdown heading, in document order.
    pub(crate) anchors: Vec<Option<String>>,
    pub(crate) math_failures: usize,
}

pub(crate) fn rewrite_ast<'a>(
    root: &'a AstNode<'a>,
    hooks: &RenderHooks,
    syntax_set: &SyntaxSet,
    class_style: &ClassStyle,
) -> RewriteOutcome {
    let mut walker = RewriteWalker {
        hooks,
        syntax_set,
        class_style,
        slugger: AnchorSlugger::new(),
        outcome: RewriteOutcome::default(),
    };
    walker.visit_nodes(root);
    walker.outcome
}

struct RewriteWalker<'a> {
    hooks: &'a RenderHooks,
    syntax_set: &'a SyntaxSet,
    class_style: &'a ClassStyle,
    slugger: AnchorSlugger,
    outcome: RewriteOutcome,
}

impl RewriteWalker<'_> {
    fn visit_nodes(&mut self, node: &AstNode<'_>) {
        if let Some(literal) = lone_display_math(node) {
            let html = self.typeset_math(&literal, true);
            if let Some(math) = node.first_child() {
                math.detach();
            }
            node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal: format!("{html}\n"),
            });
            return;
        }

        if is_heading(node) {
            let text = collect_inline_text(node);
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            let anchor = (self.hooks.heading)(&normalized, &mut self.slugger);
            self.outcome.anchors.push(anchor);
        }

        self.rewrite_leaf(node);

        let mut child = node.first_child();
        while let Some(next) = child {
            self.visit_nodes(next);
            child = next.next_sibling();
        }
    }

    fn rewrite_leaf(&mut self, node: &AstNode<'_>) {
        let replacement = {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Math(math) => Some(self.render_math(&math.literal, math.display_math)),
                NodeValue::CodeBlock(block) => Some(self.render_code(&block.info, &block.literal)),
                NodeValue::Text(text) => match (self.hooks.text)(text) {
                    TextRewrite::Unchanged => None,
                    TextRewrite::Text(text) => Some(NodeValue::Text(text.into())),
                    TextRewrite::Html(html) => Some(NodeValue::HtmlInline(html)),
                },
                _ => None,
            }
        };

        if let Some(value) = replacement {
            node.data.borrow_mut().value = value;
        }
    }

    fn render_math(&mut self, literal: &str, display: bool) -> NodeValue {
        // Display math sharing a paragraph with text stays inline.
        NodeValue::HtmlInline(self.typeset_math(literal, display))
    }

    fn typeset_math(&mut self, literal: &str, display: bool) -> String {
        let style = if display {
            MathStyle::Display
        } else {
            MathStyle::Inline
        };

        let is_display = display;
        (self.hooks.math)(literal, style).unwrap_or_else(|err| {
            warn!(
                target = "application::render::math",
                display = is_display,
                error = %err,
                "math rendering failed; dropping expression"
            );
            metrics::counter!("inkpost_math_failures_total").increment(1);
            self.outcome.math_failures += 1;
            String::new()
        })
    }

    fn render_code(&self, info: &str, literal: &str) -> NodeValue {
        let mut segments = info.split_whitespace();
        let language = segments.next();
        let meta = segments.collect::<Vec<_>>().join(" ");
        let block = CodeBlock {
            language,
            meta: (!meta.is_empty()).then_some(meta.as_str()),
            literal,
        };

        NodeValue::HtmlBlock(NodeHtmlBlock {
            block_type: 0,
            literal: (self.hooks.code)(&block, self.syntax_set, self.class_style),
        })
    }
}

/// Literal of a paragraph whose only child is display math.
fn lone_display_math(node: &AstNode<'_>) -> Option<String> {
    if !matches!(node.data.borrow().value, NodeValue::Paragraph) {
        return None;
    }
    let child = node.first_child()?;
    if child.next_sibling().is_some() {
        return None;
    }
    let data = child.data.borrow();
    match &data.value {
        NodeValue::Math(math) if math.display_math => Some(math.literal.clone()),
        _ => None,
    }
}

fn is_heading(node: &AstNode<'_>) -> bool {
    matches!(node.data.borrow().value, NodeValue::Heading(_))
}

fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

#[cfg(test)]
mod tests {
    use comrak::{Arena, format_html, parse_document};

    use super::*;
    use crate::application::render::service::{config::default_options, syntax_set};

    fn render(markdown: &str, hooks: &RenderHooks) -> (String, RewriteOutcome) {
        let options = default_options();
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &options);
        let class_style = ClassStyle::SpacedPrefixed { prefix: "syntax-" };
        let outcome = rewrite_ast(root, hooks, syntax_set(), &class_style);
        let mut html = String::new();
        format_html(root, &options, &mut html).expect("html");
        (html, outcome)
    }

    #[test]
    fn headings_collect_anchors_in_order() {
        let (_, outcome) = render(
            "# Hello World\n\n## Hello *World*\n\n### `code` here\n",
            &RenderHooks::standard(),
        );
        assert_eq!(
            outcome.anchors,
            vec![
                Some("hello-world".to_string()),
                Some("hello-world-2".to_string()),
                Some("code-here".to_string()),
            ]
        );
    }

    #[test]
    fn inline_math_renders_with_katex() {
        let (html, outcome) = render("$a^2$", &RenderHooks::standard());
        assert!(html.contains("data-role=\"math-inline\""));
        assert!(html.contains("class=\"katex"));
        assert_eq!(outcome.math_failures, 0);
    }

    #[test]
    fn lone_display_math_replaces_its_paragraph() {
        let (html, outcome) = render("$$x^2$$\n", &RenderHooks::standard());
        assert!(html.starts_with("<div data-role=\"math-block\""));
        assert!(!html.contains("<p"));
        assert_eq!(outcome.math_failures, 0);

        let (mixed, _) = render("see $$x^2$$ here\n", &RenderHooks::standard());
        assert!(mixed.starts_with("<p"));
        assert!(mixed.contains("data-role=\"math-block\""));
    }

    #[test]
    fn broken_math_leaves_nothing_behind() {
        let (html, outcome) = render("before $\\frac{$ after", &RenderHooks::standard());
        assert_eq!(outcome.math_failures, 1);
        assert!(!html.contains("frac"));
        assert!(html.contains("before"));
        assert!(html.contains("after"));
    }

    #[test]
    fn code_blocks_are_highlighted() {
        let (html, _) = render("```rust\nfn main() {}\n```\n", &RenderHooks::standard());
        assert!(html.contains("syntax-lang-rust"));
        assert!(html.contains("syntax-"));
    }

    #[test]
    fn minimal_hooks_keep_code_plain() {
        let (html, outcome) = render("# Title\n\n```rust\nfn main() {}\n```\n", &RenderHooks::minimal());
        assert_eq!(outcome.anchors, vec![None]);
        assert!(html.contains("<code>fn main() {}\n</code>"));
    }
}
