use lol_html::{RewriteStrSettings, comments, element, rewrite_str};
use once_cell::sync::Lazy;
use tracing::warn;

use super::service::MarkdownRenderer;

pub const DEFAULT_EXCERPT_LENGTH: usize = 157;
pub const EXCERPT_SUFFIX: &str = "...";

static MINIMAL_RENDERER: Lazy<MarkdownRenderer> = Lazy::new(MarkdownRenderer::minimal);

/// Plain-text summary of `markdown` for feeds and meta descriptions.
///
/// The suffix is appended whether or not anything was cut.
pub fn excerpt(markdown: &str, max_len: usize) -> String {
    let html = MINIMAL_RENDERER.render(markdown);
    let text = collapse_whitespace(&decode_basic_entities(&strip_tags(&html)));

    let mut excerpt: String = text.chars().take(max_len).collect();
    excerpt.push_str(EXCERPT_SUFFIX);
    excerpt
}

fn strip_tags(html: &str) -> String {
    let stripped = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("*", |el| {
                    match el.tag_name().as_str() {
                        "script" | "style" => el.remove(),
                        _ => el.remove_and_keep_content(),
                    }
                    Ok(())
                }),
                comments!("*", |comment| {
                    comment.remove();
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    );

    stripped.unwrap_or_else(|err| {
        warn!(
            target = "application::render::excerpt",
            error = %err,
            "tag stripping failed; excerpt will be empty"
        );
        String::new()
    })
}

fn decode_basic_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_text_is_cut_to_length_plus_suffix() {
        let source = "abcdefghij".repeat(50);
        let out = excerpt(&source, DEFAULT_EXCERPT_LENGTH);
        assert_eq!(out.chars().count(), DEFAULT_EXCERPT_LENGTH + EXCERPT_SUFFIX.len());
        assert!(out.starts_with("abcdefghij"));
        assert!(out.ends_with("..."));
    }

    #[test]
    fn short_text_still_gets_suffix() {
        assert_eq!(excerpt("Hello *there*", 157), "Hello there...");
    }

    #[test]
    fn markup_and_entities_are_flattened() {
        let source = "# Title\n\nSome `code` & <span>raw</span> text.\n\n- one\n- two\n";
        assert_eq!(
            excerpt(source, 157),
            "Title Some code & raw text. one two..."
        );
    }

    #[test]
    fn scripts_and_comments_do_not_leak() {
        let source = "<script>alert(1)</script>\n\n<!-- hidden -->\n\nvisible\n";
        assert_eq!(excerpt(source, 157), "visible...");
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let out = excerpt("éééééééééé", 4);
        assert_eq!(out, "éééé...");
    }
}
