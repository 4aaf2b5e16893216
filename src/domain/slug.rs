//! Heading anchor ids.
//!
//! Headings are slugified with the `slug` crate. Han characters are first
//! spelled out in pinyin so a heading like “基线对齐” becomes `ji-xian-dui-qi`
//! rather than an empty id.

use std::collections::{HashMap, HashSet};

use pinyin::ToPinyin;
use slug::slugify;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("heading text is empty")]
    EmptyHeading,
    #[error("heading `{heading}` has no characters usable in an id")]
    NoIdCharacters { heading: String },
}

/// Slug of a single heading, without any de-duplication.
pub fn heading_slug(heading: &str) -> Result<String, SlugError> {
    if heading.trim().is_empty() {
        return Err(SlugError::EmptyHeading);
    }

    let slug = slugify(spell_out_han(heading));
    if slug.is_empty() {
        return Err(SlugError::NoIdCharacters {
            heading: heading.to_string(),
        });
    }
    Ok(slug)
}

/// Hands out anchor ids for one document, in heading order.
///
/// A repeated slug gets the first free `-N` suffix starting at 2, so ids stay
/// unique even when a heading literally reads `Intro 2`.
#[derive(Debug, Default)]
pub struct AnchorSlugger {
    next_suffix: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_for(&mut self, heading: &str) -> Result<String, SlugError> {
        let base = heading_slug(heading)?;

        let anchor = if self.issued.contains(&base) {
            let suffix = self.next_suffix.entry(base.clone()).or_insert(2);
            loop {
                let candidate = format!("{base}-{suffix}");
                *suffix += 1;
                if !self.issued.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base
        };

        self.issued.insert(anchor.clone());
        Ok(anchor)
    }
}

/// Replace each Han character with its toneless pinyin, space separated.
/// Everything else is left for `slugify`.
fn spell_out_han(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch.to_pinyin() {
            Some(pinyin) => {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(pinyin.plain());
                out.push(' ');
            }
            None => out.push(ch),
        }
    }
    out
}
