use inkpost::application::render::{
    DEFAULT_EXCERPT_LENGTH, EXCERPT_SUFFIX, MarkdownRenderer, RenderPipeline,
    RenderPipelineConfig, Sanitizer, directives::{self, DirectiveEnv}, excerpt,
};
use inkpost::domain::context::{AccountTier, RenderContext};

fn load_markdown() -> String {
    include_str!("fixtures/kitchen_sink.md").to_string()
}

fn load_context() -> RenderContext {
    serde_json::from_str(include_str!("fixtures/blog_context.json")).expect("fixture context")
}

fn render(markdown: &str, tier: AccountTier) -> String {
    let mut context = load_context().with_tier(tier);
    context.raw_content = markdown.to_string();
    RenderPipeline::default().render(&context).html
}

#[test]
fn headings_get_unique_anchor_ids() {
    let html = render(&load_markdown(), AccountTier::Free);

    assert!(html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
    assert!(html.contains("<h2 id=\"hello-world-2\">Hello World</h2>"));
    assert!(!html.contains("data-sourcepos"));
}

#[test]
fn links_are_rewritten_and_escaped() {
    let html = render(&load_markdown(), AccountTier::Free);

    assert!(html.contains("href=\"https://docs.example.com/guide\""));
    assert!(html.contains("target=\"_blank\""));
    assert!(html.contains("rel=\"noopener noreferrer\""));
    assert!(!html.contains("tab:"));
    assert!(html.contains("href=\"https://en.wikipedia.org/wiki/Rust_%28programming_language%29\""));
}

#[test]
fn code_blocks_keep_directives_literal() {
    let html = render(&load_markdown(), AccountTier::Free);

    assert!(html.contains("blog_title"));
    assert!(!html.contains("Field Notes"));
    assert!(html.contains("<pre"));
}

#[test]
fn math_and_typography_are_rendered() {
    let html = render(&load_markdown(), AccountTier::Free);

    assert_eq!(html.matches("data-role=\"math-inline\"").count(), 2);
    assert!(html.contains("katex"));
    assert!(html.contains("Copyright ©"));
    assert!(html.contains("<mark>highlighted</mark>"));
    assert!(html.contains("<del>struck</del>"));
    assert!(html.contains("<table"));
}

#[test]
fn free_tier_is_sanitised() {
    let markdown = concat!(
        "<script>alert(1)</script>\n\n",
        "<p onclick=\"steal()\">click</p>\n\n",
        "<iframe src=\"https://www.youtube.com/embed/abc\"></iframe>\n\n",
        "<iframe src=\"https://evil.example/embed\"></iframe>\n\n",
        "[bad](javascript:alert(1))\n",
    );

    let html = render(markdown, AccountTier::Free);

    assert!(!html.contains("<script"));
    assert!(!html.contains("onclick"));
    assert!(html.contains("https://www.youtube.com/embed/abc"));
    assert!(!html.contains("evil.example"));
    assert!(!html.contains("javascript:"));
    assert!(html.contains("click"));
}

#[test]
fn upgraded_tier_passes_html_through() {
    let markdown = "<script>track()</script>\n\n<p onclick=\"go()\">hi</p>\n";

    let html = render(markdown, AccountTier::Upgraded);

    assert!(html.contains("<script>track()</script>"));
    assert!(html.contains("onclick=\"go()\""));
}

#[test]
fn sanitising_is_idempotent() {
    let sanitizer = Sanitizer::default();
    let once = sanitizer.sanitize(
        "<div onmouseover=\"x()\"><a href=\"vbscript:y\">a</a><form><b>kept</b></form></div>",
    );
    let twice = sanitizer.sanitize(&once);

    assert_eq!(once, twice);
    assert!(once.contains("<b>kept</b>"));
    assert!(!once.contains("<form"));
}

#[test]
fn excerpt_is_truncated_plain_text() {
    let out = excerpt(&load_markdown(), DEFAULT_EXCERPT_LENGTH);

    assert!(out.starts_with("Hello World Intro paragraph with a docs link"));
    assert!(out.ends_with(EXCERPT_SUFFIX));
    assert_eq!(
        out.chars().count(),
        DEFAULT_EXCERPT_LENGTH + EXCERPT_SUFFIX.len()
    );
    assert!(!out.contains('<'));
}

#[test]
fn excerpt_of_short_text_still_gets_suffix() {
    assert_eq!(excerpt("Just *one* line.", DEFAULT_EXCERPT_LENGTH), "Just one line....");
}

#[test]
fn render_output_carries_excerpt() {
    let pipeline = RenderPipeline::new(RenderPipelineConfig {
        excerpt_length: 11,
        ..RenderPipelineConfig::default()
    });
    let mut context = load_context();
    context.raw_content = load_markdown();

    let output = pipeline.render(&context);

    assert_eq!(output.excerpt, "Hello World...");
}

#[test]
fn expansion_without_directives_is_identity() {
    let renderer = MarkdownRenderer::standard();
    let html = renderer.render(&load_markdown().replace("{{ blog_title }}", "title"));
    let context = load_context();
    let embedded = RenderPipeline::default();
    let embed = |markdown: &str| embedded.render_body(markdown, AccountTier::Free);
    let env = DirectiveEnv::new(&context, &embed);

    assert_eq!(directives::expand(&html, &env), html);
}

#[test]
fn rendering_is_deterministic() {
    let first = render(&load_markdown(), AccountTier::Free);
    let second = render(&load_markdown(), AccountTier::Free);
    assert_eq!(first, second);
}
