use inkpost::application::render::RenderPipeline;
use inkpost::domain::context::{AccountTier, PostContext, RenderContext};
use time::macros::datetime;

fn load_context() -> RenderContext {
    serde_json::from_str(include_str!("fixtures/blog_context.json")).expect("fixture context")
}

fn render(markdown: &str, context: RenderContext) -> String {
    let mut context = context;
    context.raw_content = markdown.to_string();
    RenderPipeline::default().render(&context).html
}

fn listed_titles(html: &str) -> Vec<&str> {
    html.split("<a href=\"")
        .skip(1)
        .filter_map(|chunk| chunk.split_once("\">"))
        .filter_map(|(_, rest)| rest.split_once("</a>"))
        .map(|(title, _)| title)
        .collect()
}

fn post_context(is_page: bool) -> PostContext {
    PostContext {
        title: "On Foxes & Hounds".to_string(),
        description: "A chase".to_string(),
        published_at: datetime!(2024-05-01 10:00 UTC),
        last_modified: datetime!(2024-05-29 12:00 UTC),
        link: "https://notes.example.com/foxes/".to_string(),
        language_code: "en".to_string(),
        is_page,
    }
}

#[test]
fn posts_directive_filters_orders_and_limits() {
    let html = render("{{ posts tag:foo limit:2 order:asc }}\n", load_context());

    assert!(html.contains("<ul class=\"embedded blog-posts\">"));
    assert_eq!(listed_titles(&html), ["First Foo", "Second Foo"]);
    assert!(html.contains("<time datetime=\"2024-01-10T08:00:00Z\">2024-01-10</time>"));
    assert!(!html.contains("{{"));
}

#[test]
fn posts_directive_defaults_to_newest_first_and_skips_unpublished() {
    let html = render("{{ posts tag:\"foo\" }}\n", load_context());

    assert_eq!(listed_titles(&html), ["Third Foo", "Second Foo", "First Foo"]);
    assert!(!html.contains("Scheduled Foo"));
    assert!(!html.contains("Draft Foo"));
}

#[test]
fn posts_directive_shows_descriptions_and_content_on_home_page() {
    let html = render(
        "{{ posts tag:foo,bar description:true content:true }}\n",
        load_context(),
    );

    assert_eq!(listed_titles(&html), ["Second Foo"]);
    assert!(html.contains("embedded-post-content"));
    assert!(html.contains("Body of second"));
    assert!(!html.contains("<script"));
}

#[test]
fn posts_directive_omits_content_inside_an_ordinary_post() {
    let context = load_context().with_post(post_context(false));
    let html = render("{{ posts tag:foo limit:1 order:asc content:true }}\n", context);

    assert_eq!(listed_titles(&html), ["First Foo"]);
    assert!(!html.contains("embedded-post-content"));
}

#[test]
fn posts_directive_with_no_match_renders_placeholder_item() {
    let html = render("{{ posts tag:nothing }}\n", load_context());
    assert!(html.contains("<li>No posts</li>"));
}

#[test]
fn email_signup_depends_on_tier() {
    for markdown in ["Join: {{ email-signup }}\n", "Join: {{email-signup}}\n"] {
        let free = render(markdown, load_context());
        assert_eq!(free.trim(), "<p>Join: </p>", "{markdown}");

        let upgraded = render(markdown, load_context().with_tier(AccountTier::Upgraded));
        assert!(upgraded.contains("class=\"email-signup\""), "{markdown}");
        assert!(upgraded.contains("action=\"https://notes.example.com/subscribe/\""));
        assert!(!upgraded.contains("{{"));
    }
}

#[test]
fn blog_tokens_are_substituted() {
    let html = render(
        "{{ blog_title }} since {{ blog_created_date }}, posted {{ blog_last_posted }} ago at {{ blog_link }}\n",
        load_context(),
    );

    assert_eq!(
        html.trim(),
        "<p>Field Notes since 2020-01-15, posted 1 day ago at https://notes.example.com/</p>"
    );
}

#[test]
fn post_tokens_stay_literal_without_a_post() {
    let html = render("{{ post_title }} / {{ post_link }}\n", load_context());
    assert!(html.contains("{{ post_title }}"));
    assert!(html.contains("{{ post_link }}"));
}

#[test]
fn post_tokens_are_substituted_and_escaped_in_a_post() {
    let context = load_context().with_post(post_context(false));
    let html = render(
        "{{ post_title }} on {{ post_published_date }}, edited {{ post_last_modified }} ago\n",
        context,
    );

    assert!(html.contains("On Foxes &amp; Hounds on 2024-05-01, edited 3 days ago"));
}

#[test]
fn unknown_directives_and_code_stay_literal() {
    let html = render(
        "{{ not_a_token }} and `{{ blog_title }}`\n",
        load_context(),
    );

    assert!(html.contains("{{ not_a_token }}"));
    assert!(html.contains("<code>{{ blog_title }}</code>"));
    assert!(!html.contains("Field Notes"));
}
