//! Post-list queries produced by `{{ posts … }}` directives.

use time::OffsetDateTime;

use super::context::PostSummary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Parameters of a single `{{ posts … }}` directive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListQuery {
    /// Raw `tag:` value; may hold several comma-separated tags.
    pub tag: Option<String>,
    pub limit: Option<usize>,
    pub order: SortOrder,
    pub show_description: bool,
    pub show_content: bool,
}

impl PostListQuery {
    /// Individual tags of the `tag:` filter, trimmed, empties dropped.
    pub fn tags(&self) -> Vec<&str> {
        self.tag
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Apply the query to the blog's posts.
    ///
    /// Only published, non-page posts whose publication time is not in the
    /// future are eligible. Every listed tag must be present on a post.
    pub fn select<'a>(&self, posts: &'a [PostSummary], now: OffsetDateTime) -> Vec<&'a PostSummary> {
        let tags = self.tags();

        let mut selected: Vec<&PostSummary> = posts
            .iter()
            .filter(|post| post.publish && !post.is_page && post.published_at <= now)
            .filter(|post| tags.iter().all(|tag| post.has_tag(tag)))
            .collect();

        match self.order {
            SortOrder::Asc => selected.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
            SortOrder::Desc => selected.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, macros::datetime};

    fn post(title: &str, days: i64, tags: &[&str]) -> PostSummary {
        PostSummary {
            title: title.to_string(),
            slug: title.to_ascii_lowercase(),
            link: format!("/{}/", title.to_ascii_lowercase()),
            published_at: datetime!(2024-01-01 0:00 UTC) + Duration::days(days),
            publish: true,
            is_page: false,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            meta_description: String::new(),
            content: String::new(),
        }
    }

    fn titles(posts: &[&PostSummary]) -> Vec<String> {
        posts.iter().map(|post| post.title.clone()).collect()
    }

    #[test]
    fn select_defaults_to_newest_first() {
        let posts = vec![post("A", 1, &[]), post("B", 3, &[]), post("C", 2, &[])];
        let query = PostListQuery::default();
        let now = datetime!(2025-01-01 0:00 UTC);

        assert_eq!(titles(&query.select(&posts, now)), ["B", "C", "A"]);
    }

    #[test]
    fn select_skips_drafts_pages_and_future_posts() {
        let mut draft = post("Draft", 1, &[]);
        draft.publish = false;
        let mut page = post("About", 1, &[]);
        page.is_page = true;
        let future = post("Future", 400, &[]);
        let posts = vec![draft, page, future, post("Live", 2, &[])];

        let now = datetime!(2024-06-01 0:00 UTC);
        let query = PostListQuery::default();

        assert_eq!(titles(&query.select(&posts, now)), ["Live"]);
    }

    #[test]
    fn select_requires_every_tag() {
        let posts = vec![
            post("Both", 1, &["rust", "web"]),
            post("Rust", 2, &["rust"]),
            post("Web", 3, &["Web"]),
        ];
        let query = PostListQuery {
            tag: Some(" rust , web ".to_string()),
            ..PostListQuery::default()
        };
        let now = datetime!(2025-01-01 0:00 UTC);

        assert_eq!(query.tags(), ["rust", "web"]);
        assert_eq!(titles(&query.select(&posts, now)), ["Both"]);
    }

    #[test]
    fn select_applies_order_then_limit() {
        let posts: Vec<PostSummary> = (1..=5).map(|day| post(&format!("P{day}"), day, &["foo"])).collect();
        let query = PostListQuery {
            tag: Some("foo".to_string()),
            limit: Some(2),
            order: SortOrder::Asc,
            ..PostListQuery::default()
        };
        let now = datetime!(2025-01-01 0:00 UTC);

        assert_eq!(titles(&query.select(&posts, now)), ["P1", "P2"]);
    }
}
