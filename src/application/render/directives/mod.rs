//! `{{ … }}` directive expansion over rendered HTML.
//!
//! Expansion runs in one left-to-right pass: `<pre>`, `<code>`, `<script>`
//! and `<style>` regions are swapped out first, every `{{ … }}` is resolved
//! or left literal, and the regions are swapped back. Inserted fragments are
//! never scanned again.

mod grammar;
mod posts;
mod protect;
mod tokens;

use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::application::render::types::{EmbeddedRenderer, RenderError};
use crate::domain::context::RenderContext;
use crate::util::{locale::DEFAULT_DATE_FORMAT, timezone::resolve_timezone};

use self::grammar::{Directive, parse_directive};

pub use self::posts::{EmbeddedPostListTemplate, EmbeddedPostView};
pub use self::tokens::SubscribeFormTemplate;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Everything directive expansion reads, resolved once per render.
pub struct DirectiveEnv<'a> {
    pub context: &'a RenderContext,
    pub timezone: Tz,
    /// The blog's date format, or the default when it has none.
    pub date_format: &'a str,
    pub embedded: &'a dyn EmbeddedRenderer,
}

impl<'a> DirectiveEnv<'a> {
    pub fn new(context: &'a RenderContext, embedded: &'a dyn EmbeddedRenderer) -> Self {
        Self {
            context,
            timezone: resolve_timezone(&context.timezone_name),
            date_format: effective_format(&context.blog.date_format, DEFAULT_DATE_FORMAT),
            embedded,
        }
    }

    /// Replace the built-in fallback date format.
    pub fn with_default_date_format(mut self, default: &'a str) -> Self {
        self.date_format = effective_format(&self.context.blog.date_format, default);
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

fn effective_format<'a>(configured: &'a str, default: &'a str) -> &'a str {
    if configured.trim().is_empty() {
        default
    } else {
        configured
    }
}

/// Expand every recognised directive in `html`. Unknown or malformed
/// directives stay as literal text.
pub fn expand(html: &str, env: &DirectiveEnv<'_>) -> String {
    let (swapped, regions) = protect::protect(html);
    let mut expanded_count = 0u64;

    let expanded = scan(&swapped, |inner| {
        let resolved = resolve(inner, env);
        if resolved.is_some() {
            expanded_count += 1;
        }
        resolved
    });

    if expanded_count > 0 {
        metrics::counter!("inkpost_directives_expanded_total").increment(expanded_count);
        debug!(
            target = "application::render::directives",
            expanded = expanded_count,
            protected = regions.len(),
            "directives expanded"
        );
    }

    regions.restore(expanded)
}

fn resolve(inner: &str, env: &DirectiveEnv<'_>) -> Option<String> {
    let result = match parse_directive(inner)? {
        Directive::Posts(query) => posts::render_post_list(&query, env).map(Some),
        Directive::Token(token) => tokens::substitute(token, env),
    };

    result.unwrap_or_else(|err: RenderError| {
        warn!(
            target = "application::render::directives",
            directive = inner.trim(),
            error = %err,
            "directive expansion failed; leaving it literal"
        );
        None
    })
}

/// Find each `}}`, pair it with the nearest preceding `{{` and ask `resolve`
/// for a replacement. Linear in the input length.
fn scan<F>(html: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut output = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(close) = rest.find(CLOSE) {
        let head = &rest[..close];
        let end = close + CLOSE.len();
        let replacement = head
            .rfind(OPEN)
            .and_then(|open| resolve(&head[open + OPEN.len()..]).map(|value| (open, value)));

        match replacement {
            Some((open, value)) => {
                output.push_str(&head[..open]);
                output.push_str(&value);
            }
            None => output.push_str(&rest[..end]),
        }
        rest = &rest[end..];
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
pub(crate) mod tests {
    use time::{OffsetDateTime, macros::datetime};

    use super::*;
    use crate::domain::context::{AccountTier, BlogSettings, PostSummary};

    pub(crate) struct StubEmbed;

    impl EmbeddedRenderer for StubEmbed {
        fn render_embedded(&self, _markdown: &str) -> String {
            "<p>embedded</p>".to_string()
        }
    }

    pub(crate) fn blog() -> BlogSettings {
        BlogSettings {
            title: "Field Notes".to_string(),
            description: "Things I saw".to_string(),
            created_at: datetime!(2020-01-01 0:00 UTC),
            last_modified: datetime!(2024-05-29 12:00 UTC),
            last_post_at: None,
            link: "https://blog.example".to_string(),
            date_format: String::new(),
            language_code: "en".to_string(),
        }
    }

    pub(crate) fn post(title: &str, published_at: OffsetDateTime, tags: &[&str]) -> PostSummary {
        let slug = title.to_ascii_lowercase().replace(' ', "-");
        PostSummary {
            title: title.to_string(),
            link: format!("https://blog.example/{slug}/"),
            slug,
            published_at,
            publish: true,
            is_page: false,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            meta_description: format!("About {title}"),
            content: format!("# {title}"),
        }
    }

    fn expand_with(html: &str, context: &RenderContext) -> String {
        expand(html, &DirectiveEnv::new(context, &StubEmbed))
    }

    fn context() -> RenderContext {
        RenderContext::new("", blog(), datetime!(2024-06-01 12:00 UTC))
    }

    #[test]
    fn scan_pairs_nearest_braces() {
        let out = scan("a {{ x }} b {{ {{ y }} c }}", |inner| {
            (inner.trim() == "y").then(|| "Y".to_string())
        });
        assert_eq!(out, "a {{ x }} b {{ Y c }}");
    }

    #[test]
    fn scan_without_close_is_untouched() {
        let out = scan("{{ blog_title ", |_| Some("never".to_string()));
        assert_eq!(out, "{{ blog_title ");
    }

    #[test]
    fn tokens_expand_in_place() {
        let out = expand_with("<p>{{ blog_title }} at {{blog_link}}</p>", &context());
        assert_eq!(out, "<p>Field Notes at https://blog.example</p>");
    }

    #[test]
    fn unknown_and_post_only_tokens_stay_literal() {
        let html = "<p>{{ nope }} {{ post_title }} {{ posts colour:red }}</p>";
        assert_eq!(expand_with(html, &context()), html);
    }

    #[test]
    fn protected_regions_are_not_expanded() {
        let html = "<pre><code>{{ blog_title }}</code></pre><p><code>{{ blog_link }}</code> {{ blog_title }}</p>";
        assert_eq!(
            expand_with(html, &context()),
            "<pre><code>{{ blog_title }}</code></pre><p><code>{{ blog_link }}</code> Field Notes</p>"
        );
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let mut context = context();
        context.blog.title = "{{ blog_link }}".to_string();
        assert_eq!(expand_with("{{ blog_title }}", &context), "{{ blog_link }}");
    }

    #[test]
    fn email_signup_depends_on_tier() {
        let html = "<p>before</p>{{ email-signup }}<p>after</p>";
        assert_eq!(expand_with(html, &context()), "<p>before</p><p>after</p>");

        let upgraded = context().with_tier(AccountTier::Upgraded);
        let out = expand_with(html, &upgraded);
        assert!(out.contains("<form class=\"email-signup\""));
    }

    #[test]
    fn default_date_format_can_be_overridden() {
        let context = context();
        let env = DirectiveEnv::new(&context, &StubEmbed).with_default_date_format("%Y");
        assert_eq!(expand("{{ blog_created_date }}", &env), "2020");
    }
}
