use askama::Template;

use crate::application::render::types::RenderError;
use crate::util::{
    html::escape_html,
    locale::{format_date, resolve_locale},
    timesince::timesince,
};

use super::{DirectiveEnv, grammar::Token};

#[derive(Template)]
#[template(path = "embedded/subscribe_form.html")]
pub struct SubscribeFormTemplate {
    pub action: String,
}

/// Value substituted for a metadata token. `None` leaves the token literal,
/// which is what post-scoped tokens do outside of a post.
pub(crate) fn substitute(token: Token, env: &DirectiveEnv<'_>) -> Result<Option<String>, RenderError> {
    let context = env.context;
    let blog = &context.blog;
    let now = context.rendered_at;

    let value = match token {
        Token::EmailSignup => {
            if context.account_tier.is_upgraded() {
                subscribe_form(&blog.link)?
            } else {
                String::new()
            }
        }
        Token::BlogTitle => escape_html(&blog.title),
        Token::BlogDescription => escape_html(&blog.description),
        Token::BlogCreatedDate => format_date(
            blog.created_at,
            env.timezone,
            env.date_format,
            resolve_locale(&blog.language_code),
        ),
        Token::BlogLastModified => timesince(blog.last_modified, now),
        Token::BlogLastPosted => blog
            .last_post_at
            .map(|last_post| timesince(last_post, now))
            .unwrap_or_default(),
        Token::BlogLink => blog.link.clone(),
        Token::PostTitle
        | Token::PostDescription
        | Token::PostPublishedDate
        | Token::PostLastModified
        | Token::PostLink => {
            let Some(post) = context.post.as_ref() else {
                return Ok(None);
            };
            match token {
                Token::PostTitle => escape_html(&post.title),
                Token::PostDescription => escape_html(&post.description),
                Token::PostPublishedDate => format_date(
                    post.published_at,
                    env.timezone,
                    env.date_format,
                    resolve_locale(&post.language_code),
                ),
                Token::PostLastModified => timesince(post.last_modified, now),
                _ => post.link.clone(),
            }
        }
    };

    Ok(Some(value))
}

fn subscribe_form(blog_link: &str) -> Result<String, RenderError> {
    let action = format!("{}/subscribe/", blog_link.trim_end_matches('/'));
    SubscribeFormTemplate { action }
        .render()
        .map_err(|err| RenderError::Template {
            message: err.to_string(),
        })
}
