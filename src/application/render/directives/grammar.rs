//! Parser for the text between `{{` and `}}`.
//!
//! ```text
//! directive := posts-directive | token
//! posts     := "posts" (sep param)*
//! param     := key ":" value          key ∈ tag limit order description content
//! sep       := (whitespace | "|")+
//! value     := bare | '"' any* '"'
//! ```
//!
//! Anything else is not a directive and stays literal in the document.

use crate::domain::posts::{PostListQuery, SortOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    Posts(PostListQuery),
    Token(Token),
}

/// The closed set of metadata placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    EmailSignup,
    BlogTitle,
    BlogDescription,
    BlogCreatedDate,
    BlogLastModified,
    BlogLastPosted,
    BlogLink,
    PostTitle,
    PostDescription,
    PostPublishedDate,
    PostLastModified,
    PostLink,
}

impl Token {
    fn from_name(name: &str) -> Option<Self> {
        let token = match name {
            "email-signup" => Token::EmailSignup,
            "blog_title" => Token::BlogTitle,
            "blog_description" => Token::BlogDescription,
            "blog_created_date" => Token::BlogCreatedDate,
            "blog_last_modified" => Token::BlogLastModified,
            "blog_last_posted" => Token::BlogLastPosted,
            "blog_link" => Token::BlogLink,
            "post_title" => Token::PostTitle,
            "post_description" => Token::PostDescription,
            "post_published_date" => Token::PostPublishedDate,
            "post_last_modified" => Token::PostLastModified,
            "post_link" => Token::PostLink,
            _ => return None,
        };
        Some(token)
    }
}

/// Parse the inner text of a `{{ … }}` directive. The text comes from
/// rendered HTML, so `&quot;` stands for a double quote.
pub(crate) fn parse_directive(inner: &str) -> Option<Directive> {
    let inner = inner.trim();
    if let Some(token) = Token::from_name(inner) {
        return Some(Directive::Token(token));
    }

    let decoded = inner.replace("&quot;", "\"").replace("&amp;", "&");
    let words = tokenize(&decoded)?;
    let (head, params) = words.split_first()?;
    if !head.eq_ignore_ascii_case("posts") {
        return None;
    }
    parse_posts_params(params).map(Directive::Posts)
}

fn parse_posts_params(params: &[String]) -> Option<PostListQuery> {
    let mut query = PostListQuery::default();

    for param in params {
        let (key, value) = param.split_once(':')?;
        match key.to_ascii_lowercase().as_str() {
            "tag" => {
                let value = value.trim();
                query.tag = (!value.is_empty()).then(|| value.to_string());
            }
            "limit" => {
                // Non-numeric limits are ignored, not rejected.
                if let Ok(limit) = value.trim().parse::<usize>() {
                    query.limit = Some(limit);
                }
            }
            "order" => {
                if value.eq_ignore_ascii_case("asc") {
                    query.order = SortOrder::Asc;
                } else if value.eq_ignore_ascii_case("desc") {
                    query.order = SortOrder::Desc;
                }
            }
            "description" => query.show_description = value.eq_ignore_ascii_case("true"),
            "content" => query.show_content = value.eq_ignore_ascii_case("true"),
            _ => return None,
        }
    }

    Some(query)
}

/// Split on whitespace and `|`, honouring double quotes. `None` when a quote
/// is left open.
fn tokenize(input: &str) -> Option<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_word = true;
                loop {
                    match chars.next()? {
                        '"' => break,
                        quoted => current.push(quoted),
                    }
                }
            }
            '|' => flush(&mut words, &mut current, &mut in_word),
            ch if ch.is_whitespace() => flush(&mut words, &mut current, &mut in_word),
            ch => {
                in_word = true;
                current.push(ch);
            }
        }
    }
    flush(&mut words, &mut current, &mut in_word);

    Some(words)
}

fn flush(words: &mut Vec<String>, current: &mut String, in_word: &mut bool) {
    if *in_word {
        words.push(std::mem::take(current));
        *in_word = false;
    }
}
