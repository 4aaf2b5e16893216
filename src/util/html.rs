//! Minimal HTML escaping for text the renderer places itself.
//!
//! Only the five markup characters are touched, so titles and descriptions
//! stay readable in the output. Free-form author strings copied into
//! attributes (code-fence metadata) go through `ammonia::clean_text`
//! instead, which also escapes whitespace and every other character that
//! could end an attribute.

/// Escape text for use in HTML element content or quoted attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
