//! Placeholder swap for regions directives must not touch.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// `<pre>`, `<code>`, `<script>` and `<style>` elements, non-greedy across
/// newlines. The regex engine is linear-time, so hostile input cannot blow up.
static PROTECTED_REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<pre\b.*?</pre\s*>|<code\b.*?</code\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
    )
    .expect("protected region pattern")
});

/// Ordered `(token, literal)` pairs created by [`protect`] and drained by
/// [`ProtectedRegions::restore`] within one expansion.
#[derive(Debug)]
pub(crate) struct ProtectedRegions {
    prefix: String,
    entries: Vec<(String, String)>,
}

/// Swap every protected region for a unique token.
///
/// Tokens embed a per-call nonce, so literal text in the document cannot
/// collide with them.
pub(crate) fn protect(html: &str) -> (String, ProtectedRegions) {
    let prefix = format!("__PROTECTED_{}_", Uuid::new_v4().simple());
    let mut entries = Vec::new();

    let swapped = PROTECTED_REGION.replace_all(html, |caps: &regex::Captures<'_>| {
        let token = format!("{prefix}{}__", entries.len());
        entries.push((token.clone(), caps[0].to_string()));
        token
    });

    (swapped.into_owned(), ProtectedRegions { prefix, entries })
}

impl ProtectedRegions {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Put the literals back in one left-to-right pass.
    ///
    /// Restored text is never rescanned and each token is consumed at most
    /// once, so a literal that happens to contain another token's text stays
    /// as written.
    pub(crate) fn restore(self, html: String) -> String {
        if self.entries.is_empty() {
            return html;
        }

        let prefix = self.prefix;
        let mut literals: Vec<Option<String>> = self
            .entries
            .into_iter()
            .map(|(_, literal)| Some(literal))
            .collect();

        let mut out = String::with_capacity(html.len());
        let mut rest = html.as_str();
        while let Some(start) = rest.find(&prefix) {
            out.push_str(&rest[..start]);
            let after = &rest[start + prefix.len()..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();

            let literal = if after[digits..].starts_with("__") {
                after[..digits]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| literals.get_mut(index))
                    .and_then(Option::take)
            } else {
                None
            };

            match literal {
                Some(literal) => {
                    out.push_str(&literal);
                    rest = &after[digits + 2..];
                }
                None => {
                    out.push_str(&prefix);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
