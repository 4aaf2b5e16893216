use askama::Template;
use time::format_description::well_known::Rfc3339;

use crate::application::render::types::RenderError;
use crate::domain::{context::PostSummary, posts::PostListQuery};
use crate::util::locale::{format_date, resolve_locale};

use super::DirectiveEnv;

#[derive(Clone)]
pub struct EmbeddedPostView {
    pub title: String,
    pub link: String,
    pub datetime: String,
    pub date: String,
    pub has_description: bool,
    pub description: String,
    pub has_content: bool,
    pub content_html: String,
}

#[derive(Template)]
#[template(path = "embedded/post_list.html")]
pub struct EmbeddedPostListTemplate {
    pub posts: Vec<EmbeddedPostView>,
}

/// Render the fragment replacing one `{{ posts … }}` directive.
pub(crate) fn render_post_list(
    query: &PostListQuery,
    env: &DirectiveEnv<'_>,
) -> Result<String, RenderError> {
    let context = env.context;
    let locale = resolve_locale(&context.blog.language_code);
    let show_content = query.show_content && context.allows_embedded_content();

    let posts = query
        .select(&context.posts, context.rendered_at)
        .into_iter()
        .map(|post| post_view(post, query, show_content, env, locale))
        .collect();

    EmbeddedPostListTemplate { posts }
        .render()
        .map_err(|err| RenderError::Template {
            message: err.to_string(),
        })
}

fn post_view(
    post: &PostSummary,
    query: &PostListQuery,
    show_content: bool,
    env: &DirectiveEnv<'_>,
    locale: chrono::Locale,
) -> EmbeddedPostView {
    let description = post.meta_description.trim();
    let content_html = if show_content {
        env.embedded.render_embedded(&post.content)
    } else {
        String::new()
    };

    EmbeddedPostView {
        title: post.title.clone(),
        link: post.link.clone(),
        datetime: post.published_at.format(&Rfc3339).unwrap_or_default(),
        date: format_date(post.published_at, env.timezone, env.date_format, locale),
        has_description: query.show_description && !description.is_empty(),
        description: description.to_string(),
        has_content: show_content,
        content_html,
    }
}
