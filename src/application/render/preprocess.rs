//! Markdown source rewrites applied before parsing.
//!
//! Both passes leave fenced code blocks alone; the math pass additionally
//! skips inline code spans so `` `$$x$$` `` stays literal.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `[label](url)` where the URL holds a `(` with an optional `)` and tail.
static NESTED_PAREN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]\n]*)\]\(((?:tab:)?[^\s()]*\([^\s()]*\)?[^\s()]*)\)")
        .expect("nested paren link pattern")
});

/// `$$x$$` on a single line: the legacy inline math notation.
static LEGACY_INLINE_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$([^\n$]+?)\$\$").expect("legacy math pattern"));

/// Percent-encode parentheses inside link URLs so the link parser does not
/// close the destination early. Idempotent: encoded URLs no longer match.
pub fn escape_nested_parens(markdown: &str) -> String {
    map_prose(markdown, false, |prose| {
        NESTED_PAREN_LINK.replace_all(prose, |caps: &Captures<'_>| {
            let url = caps[2].replace('(', "%28").replace(')', "%29");
            format!("[{}]({url})", &caps[1])
        })
    })
}

/// Rewrite single-line `$$x$$` to `$x$`. Multi-line `$$` blocks are display
/// math already and are left as they are.
pub fn normalize_latex(markdown: &str) -> String {
    map_prose(markdown, true, |prose| {
        LEGACY_INLINE_MATH.replace_all(prose, "$$${1}$$")
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Prose(&'a str),
    Code(&'a str),
}

fn map_prose<F>(markdown: &str, inline_code: bool, rewrite: F) -> String
where
    F: for<'a> Fn(&'a str) -> Cow<'a, str>,
{
    let mut output = String::with_capacity(markdown.len());
    for segment in segments(markdown, inline_code) {
        match segment {
            Segment::Prose(text) => output.push_str(&rewrite(text)),
            Segment::Code(text) => output.push_str(text),
        }
    }
    output
}

fn segments(markdown: &str, inline_code: bool) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut prose_start = 0;
    let mut fence_start = 0;
    let mut offset = 0;
    let mut fence: Option<(u8, usize)> = None;

    for line in markdown.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        match fence {
            None => {
                if let Some(open) = opening_fence(line) {
                    push_prose(&mut out, &markdown[prose_start..line_start], inline_code);
                    fence = Some(open);
                    fence_start = line_start;
                }
            }
            Some((marker, len)) => {
                if closes_fence(line, marker, len) {
                    out.push(Segment::Code(&markdown[fence_start..offset]));
                    fence = None;
                    prose_start = offset;
                }
            }
        }
    }

    if fence.is_some() {
        // Unclosed fences run to the end of the document.
        out.push(Segment::Code(&markdown[fence_start..]));
    } else {
        push_prose(&mut out, &markdown[prose_start..], inline_code);
    }
    out
}

/// Strip up to three spaces of indentation; deeper lines cannot open fences.
fn fence_body(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\n', '\r']);
    let indent = line.bytes().take_while(|&b| b == b' ').count();
    (indent <= 3).then(|| &line[indent..])
}

fn marker_run(body: &str) -> Option<(u8, usize)> {
    let marker = *body.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = body.bytes().take_while(|&b| b == marker).count();
    (len >= 3).then_some((marker, len))
}

fn opening_fence(line: &str) -> Option<(u8, usize)> {
    let body = fence_body(line)?;
    let (marker, len) = marker_run(body)?;
    if marker == b'`' && body[len..].contains('`') {
        return None;
    }
    Some((marker, len))
}

fn closes_fence(line: &str, marker: u8, open_len: usize) -> bool {
    let Some(body) = fence_body(line) else {
        return false;
    };
    match marker_run(body) {
        Some((found, len)) => found == marker && len >= open_len && body[len..].trim().is_empty(),
        None => false,
    }
}

fn push_prose<'a>(out: &mut Vec<Segment<'a>>, text: &'a str, inline_code: bool) {
    if text.is_empty() {
        return;
    }
    if !inline_code {
        out.push(Segment::Prose(text));
        return;
    }

    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = backtick_run(bytes, i);
        match closing_run(bytes, i + run, run) {
            Some(end) => {
                if start < i {
                    out.push(Segment::Prose(&text[start..i]));
                }
                out.push(Segment::Code(&text[i..end]));
                start = end;
                i = end;
            }
            None => i += run,
        }
    }
    if start < text.len() {
        out.push(Segment::Prose(&text[start..]));
    }
}

fn backtick_run(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|&&b| b == b'`').count()
}

/// End offset of the next backtick run of exactly `len`, if any.
fn closing_run(bytes: &[u8], from: usize, len: usize) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let run = backtick_run(bytes, j);
            if run == len {
                return Some(j + run);
            }
            j += run;
        } else {
            j += 1;
        }
    }
    None
}
