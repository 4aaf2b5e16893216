//! Free-tier HTML sanitiser.
//!
//! A blacklist pass over rendered HTML: scripts, inline event handlers,
//! script URLs, form controls and non-whitelisted iframes are stripped;
//! everything else is kept as authored.

use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::warn;

use crate::application::render::types::RenderError;

/// Tags whose open and close tags are dropped while their children stay.
const UNWRAPPED_TAGS: [&str; 5] = ["object", "embed", "form", "input", "button"];

/// Attributes that carry a URL a browser may navigate to or execute.
const URL_ATTRIBUTES: [&str; 6] = ["href", "src", "action", "formaction", "xlink:href", "data"];

const BLOCKED_SCHEMES: [&str; 2] = ["javascript:", "vbscript:"];

/// SVG animation elements, removed outright. They can write any value into
/// another attribute (`values`, `to`, `from`, `by`), including a script URL
/// into `href`.
const SVG_ANIMATION_TAGS: [&str; 4] = ["animate", "set", "animatemotion", "animatetransform"];

/// Approved embed providers as `host[/path-prefix]`. A host matches itself
/// and any subdomain, and the path must start with the prefix.
///
/// This is stricter than a plain substring test: a provider name in the
/// query string or in a lookalike domain does not count. Providers with more
/// than one embed path list each of them.
pub const DEFAULT_IFRAME_HOSTS: &[&str] = &[
    "youtube.com/embed",
    "youtube.com/v/",
    "youtube-nocookie.com/embed",
    "youtube-nocookie.com/v/",
    "player.vimeo.com/video",
    "open.spotify.com/embed",
    "w.soundcloud.com/player",
    "bandcamp.com/EmbeddedPlayer",
    "embed.music.apple.com",
    "google.com/maps/embed",
    "docs.google.com",
    "loom.com/embed",
    "codepen.io",
    "codesandbox.io/embed",
    "stackblitz.com",
    "embed.figma.com",
    "figma.com/embed",
    "slideshare.net/slideshow/embed_code",
    "speakerdeck.com/player",
    "player.twitch.tv",
    "clips.twitch.tv",
    "share.descript.com",
    "tally.so/embed",
    "form.typeform.com",
    "calendly.com",
    "substack.com/embed",
    "archive.org/embed",
];

#[derive(Debug, Clone)]
pub struct Sanitizer {
    iframe_hosts: Vec<String>,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer {
    pub fn new() -> Self {
        Self {
            iframe_hosts: DEFAULT_IFRAME_HOSTS.iter().map(|host| host.to_string()).collect(),
        }
    }

    /// Extend the default whitelist, typically from `render.extra_iframe_hosts`.
    pub fn with_extra_iframe_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.iframe_hosts.extend(
            hosts
                .into_iter()
                .map(Into::into)
                .map(|host| host.trim().to_string())
                .filter(|host| !host.is_empty()),
        );
        self
    }

    /// Sanitise `html`. Fails closed: if the rewriter gives up, the result is
    /// empty rather than the unsanitised input.
    pub fn sanitize(&self, html: &str) -> String {
        self.try_sanitize(html).unwrap_or_else(|err| {
            warn!(
                target = "application::render::sanitize",
                error = %err,
                input_len = html.len(),
                "sanitiser failed; dropping content"
            );
            metrics::counter!("inkpost_sanitize_fail_closed_total").increment(1);
            String::new()
        })
    }

    pub fn try_sanitize(&self, html: &str) -> Result<String, RenderError> {
        let mut handlers = vec![element!("script", |el| {
            el.remove();
            Ok(())
        })];

        for tag in UNWRAPPED_TAGS {
            handlers.push(element!(tag, |el| {
                el.remove_and_keep_content();
                Ok(())
            }));
        }

        handlers.push(element!("iframe", |el| {
            let allowed = el
                .get_attribute("src")
                .is_some_and(|src| self.allows_iframe_src(&src));
            if allowed {
                el.remove_attribute("srcdoc");
            } else {
                el.remove();
            }
            Ok(())
        }));

        handlers.push(element!("*", |el| {
            let tag = el.tag_name();
            if SVG_ANIMATION_TAGS
                .iter()
                .any(|animation| tag.eq_ignore_ascii_case(animation))
            {
                el.remove();
                return Ok(());
            }

            let doomed: Vec<String> = el
                .attributes()
                .iter()
                .filter(|attr| {
                    let name = attr.name();
                    is_event_handler(&name)
                        || (URL_ATTRIBUTES.contains(&name.as_str()) && has_blocked_scheme(&attr.value()))
                })
                .map(|attr| attr.name())
                .collect();
            for name in doomed {
                el.remove_attribute(&name);
            }
            Ok(())
        }));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| RenderError::Sanitisation {
            message: err.to_string(),
        })
    }

    /// Whether an iframe pointing at `src` may stay.
    pub fn allows_iframe_src(&self, src: &str) -> bool {
        let Some((host, path)) = split_embed_url(src) else {
            return false;
        };
        self.iframe_hosts
            .iter()
            .any(|entry| matches_entry(&host, &path, entry))
    }
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.starts_with("on")
}

fn has_blocked_scheme(value: &str) -> bool {
    let normalized = normalize_url(value);
    BLOCKED_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
}

/// Decode character references and drop whitespace and control characters so
/// `jav&#x61;script:` and `java\tscript:` are recognised.
fn normalize_url(value: &str) -> String {
    let decoded = decode_references(value);
    decoded
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .flat_map(char::to_lowercase)
        .collect()
}

fn decode_references(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match decode_reference(candidate) {
            Some((decoded, consumed)) => {
                out.push(decoded);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode one reference at the start of `input`; the trailing `;` is optional
/// as browsers are lenient too.
fn decode_reference(input: &str) -> Option<(char, usize)> {
    let body = input.strip_prefix('&')?;
    if let Some(numeric) = body.strip_prefix('#') {
        let (digits, radix, prefix) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 2),
            None => (numeric, 10, 1),
        };
        let len = digits
            .chars()
            .take_while(|ch| ch.is_digit(radix))
            .count();
        if len == 0 {
            return None;
        }
        let code = u32::from_str_radix(&digits[..len], radix).ok()?;
        let mut consumed = 1 + prefix + len;
        if digits[len..].starts_with(';') {
            consumed += 1;
        }
        return Some((char::from_u32(code).unwrap_or('\u{fffd}'), consumed));
    }

    for (name, ch) in [("colon;", ':'), ("tab;", '\t'), ("newline;", '\n')] {
        if body.len() >= name.len() && body[..name.len()].eq_ignore_ascii_case(name) {
            return Some((ch, 1 + name.len()));
        }
    }
    None
}

/// Host and path of an absolute or protocol-relative URL, lowercased, without
/// query or fragment.
fn split_embed_url(src: &str) -> Option<(String, String)> {
    let src = src.trim();
    let rest = match src.find("//") {
        Some(0) => &src[2..],
        Some(idx) => {
            let scheme = src[..idx].to_ascii_lowercase();
            if scheme != "https:" && scheme != "http:" {
                return None;
            }
            &src[idx + 2..]
        }
        None => return None,
    };
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let host = authority
        .rsplit('@')
        .next()
        .unwrap_or_default()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    Some((host, path.to_ascii_lowercase()))
}

fn matches_entry(host: &str, path: &str, entry: &str) -> bool {
    let entry = entry.to_ascii_lowercase();
    let (entry_host, entry_path) = match entry.find('/') {
        Some(idx) => (&entry[..idx], &entry[idx..]),
        None => (entry.as_str(), ""),
    };
    let host_matches = host == entry_host
        || host
            .strip_suffix(entry_host)
            .is_some_and(|prefix| prefix.ends_with('.'));
    host_matches && path.starts_with(entry_path)
}
