//! Read-only inputs of a single render.
//!
//! Everything here is owned by the hosting application (blogs, posts, account
//! state); the render core only reads it for the duration of one call.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::error::DomainError;

/// Account tier of the blog owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountTier {
    #[default]
    Free,
    Upgraded,
}

/// What the sanitiser does with rendered HTML. Derived solely from the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizationPolicy {
    /// Strip scripts, handlers, dangerous URLs and non-whitelisted iframes.
    Sanitize,
    /// Trusted author: full HTML and JS allowed.
    PassThrough,
}

impl AccountTier {
    pub fn sanitization(self) -> SanitizationPolicy {
        match self {
            AccountTier::Free => SanitizationPolicy::Sanitize,
            AccountTier::Upgraded => SanitizationPolicy::PassThrough,
        }
    }

    pub fn is_upgraded(self) -> bool {
        matches!(self, AccountTier::Upgraded)
    }
}

impl std::str::FromStr for AccountTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(AccountTier::Free),
            "upgraded" => Ok(AccountTier::Upgraded),
            _ => Err(DomainError::UnknownTier(value.trim().to_string())),
        }
    }
}

/// Blog-level settings and metadata visible to directives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogSettings {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_post_at: Option<OffsetDateTime>,
    /// Canonical URL of the blog (subdomain or custom domain).
    pub link: String,
    /// strftime-style format; empty means "use the default".
    #[serde(default)]
    pub date_format: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
}

/// The post being rendered, when rendering a single post's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContext {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    pub link: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default)]
    pub is_page: bool,
}

/// A post of the blog that `{{ posts }}` directives may list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub link: String,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    #[serde(default = "default_publish")]
    pub publish: bool,
    #[serde(default)]
    pub is_page: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub meta_description: String,
    /// Raw markdown, rendered only for `content:True` listings.
    #[serde(default)]
    pub content: String,
}

impl PostSummary {
    /// Case-insensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate.trim().eq_ignore_ascii_case(tag))
    }
}

/// Everything a single render call reads.
///
/// `post` is present only when rendering a single post's content and absent
/// when rendering a blog's home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
    /// Author markdown. Context files may omit it when the body comes from
    /// elsewhere.
    #[serde(default)]
    pub raw_content: String,
    #[serde(default)]
    pub account_tier: AccountTier,
    pub blog: BlogSettings,
    #[serde(default = "default_timezone_name")]
    pub timezone_name: String,
    #[serde(default)]
    pub post: Option<PostContext>,
    #[serde(default)]
    pub posts: Vec<PostSummary>,
    /// "Now" for publication filtering and relative-time phrases.
    #[serde(with = "time::serde::rfc3339")]
    pub rendered_at: OffsetDateTime,
}

impl RenderContext {
    pub fn new(
        raw_content: impl Into<String>,
        blog: BlogSettings,
        rendered_at: OffsetDateTime,
    ) -> Self {
        Self {
            raw_content: raw_content.into(),
            account_tier: AccountTier::Free,
            blog,
            timezone_name: default_timezone_name(),
            post: None,
            posts: Vec::new(),
            rendered_at,
        }
    }

    pub fn with_tier(mut self, tier: AccountTier) -> Self {
        self.account_tier = tier;
        self
    }

    pub fn with_post(mut self, post: PostContext) -> Self {
        self.post = Some(post);
        self
    }

    pub fn with_posts(mut self, posts: Vec<PostSummary>) -> Self {
        self.posts = posts;
        self
    }

    pub fn with_timezone(mut self, timezone_name: impl Into<String>) -> Self {
        self.timezone_name = timezone_name.into();
        self
    }

    /// Full post bodies may only be embedded on pages or the home page;
    /// embedding them inside an ordinary post would recurse.
    pub fn allows_embedded_content(&self) -> bool {
        match &self.post {
            None => true,
            Some(post) => post.is_page,
        }
    }
}

fn default_language_code() -> String {
    "en".to_string()
}

fn default_timezone_name() -> String {
    "UTC".to_string()
}

fn default_publish() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn blog() -> BlogSettings {
        BlogSettings {
            title: "Field Notes".to_string(),
            description: String::new(),
            created_at: datetime!(2020-01-01 0:00 UTC),
            last_modified: datetime!(2024-01-01 0:00 UTC),
            last_post_at: None,
            link: "https://notes.example.com".to_string(),
            date_format: String::new(),
            language_code: "en".to_string(),
        }
    }

    fn post(is_page: bool) -> PostContext {
        PostContext {
            title: "Hello".to_string(),
            description: String::new(),
            published_at: datetime!(2024-01-01 0:00 UTC),
            last_modified: datetime!(2024-01-01 0:00 UTC),
            link: "https://notes.example.com/hello/".to_string(),
            language_code: "en".to_string(),
            is_page,
        }
    }

    #[test]
    fn sanitization_follows_tier() {
        assert_eq!(AccountTier::Free.sanitization(), SanitizationPolicy::Sanitize);
        assert_eq!(
            AccountTier::Upgraded.sanitization(),
            SanitizationPolicy::PassThrough
        );
    }

    #[test]
    fn embedded_content_allowed_on_home_and_pages_only() {
        let now = datetime!(2024-06-01 0:00 UTC);
        let home = RenderContext::new("", blog(), now);
        assert!(home.allows_embedded_content());

        let page = RenderContext::new("", blog(), now).with_post(post(true));
        assert!(page.allows_embedded_content());

        let ordinary = RenderContext::new("", blog(), now).with_post(post(false));
        assert!(!ordinary.allows_embedded_content());
    }

    #[test]
    fn context_deserializes_from_json_with_defaults() {
        let json = r##"{
            "raw_content": "# Hi",
            "blog": {
                "title": "Field Notes",
                "created_at": "2020-01-01T00:00:00Z",
                "last_modified": "2024-01-01T00:00:00Z",
                "link": "https://notes.example.com"
            },
            "rendered_at": "2024-06-01T00:00:00Z"
        }"##;

        let context: RenderContext = serde_json::from_str(json).expect("context");
        assert_eq!(context.account_tier, AccountTier::Free);
        assert_eq!(context.timezone_name, "UTC");
        assert_eq!(context.blog.language_code, "en");
        assert!(context.post.is_none());
        assert!(context.posts.is_empty());
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Upgraded".parse::<AccountTier>(), Ok(AccountTier::Upgraded));
        assert_eq!(
            "gold".parse::<AccountTier>(),
            Err(DomainError::UnknownTier("gold".to_string()))
        );
    }
}
