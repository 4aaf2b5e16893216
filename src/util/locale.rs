//! Locale-aware date formatting.
//!
//! The locale is always an explicit argument. Nothing here activates a
//! process-wide locale, so concurrent renders never observe each other.

use std::fmt::Write as _;

use chrono::{
    DateTime, Locale,
    format::{Item, StrftimeItems},
};
use chrono_tz::Tz;
use time::OffsetDateTime;
use tracing::warn;

use super::timezone::localized_datetime;

/// Used when a blog has no date format configured, or an unusable one.
pub const DEFAULT_DATE_FORMAT: &str = "%d %b, %Y";

/// Regions assumed for bare language codes whose doubled form (`fr_FR`)
/// does not name a locale.
const DEFAULT_REGIONS: &[(&str, &str)] = &[
    ("ar", "ar_SA"),
    ("ca", "ca_ES"),
    ("cs", "cs_CZ"),
    ("da", "da_DK"),
    ("el", "el_GR"),
    ("en", "en_US"),
    ("et", "et_EE"),
    ("fa", "fa_IR"),
    ("he", "he_IL"),
    ("hi", "hi_IN"),
    ("ja", "ja_JP"),
    ("ko", "ko_KR"),
    ("nb", "nb_NO"),
    ("no", "nb_NO"),
    ("pt", "pt_PT"),
    ("sl", "sl_SI"),
    ("sr", "sr_RS"),
    ("sv", "sv_SE"),
    ("uk", "uk_UA"),
    ("vi", "vi_VN"),
    ("zh", "zh_CN"),
];

/// Map a blog/post language code (`en`, `pt-br`, `zh_TW`) onto a date locale.
/// Unknown codes fall back to POSIX (English names).
pub fn resolve_locale(language_code: &str) -> Locale {
    let normalized = language_code.trim().replace('-', "_");
    if normalized.is_empty() {
        return Locale::POSIX;
    }

    let (language, region) = match normalized.split_once('_') {
        Some((language, region)) => (language.to_ascii_lowercase(), Some(region.to_ascii_uppercase())),
        None => (normalized.to_ascii_lowercase(), None),
    };

    let mut candidates = Vec::with_capacity(3);
    if let Some(region) = region {
        candidates.push(format!("{language}_{region}"));
    }
    if let Some((_, fallback)) = DEFAULT_REGIONS.iter().find(|(code, _)| *code == language) {
        candidates.push((*fallback).to_string());
    }
    candidates.push(format!("{language}_{}", language.to_ascii_uppercase()));

    for candidate in &candidates {
        if let Ok(locale) = Locale::try_from(candidate.as_str()) {
            return locale;
        }
    }

    warn!(
        target = "util::locale",
        language_code,
        "unknown language code; using POSIX date names"
    );
    Locale::POSIX
}

/// True when every strftime item in `format` is understood.
pub fn is_valid_date_format(format: &str) -> bool {
    !format.trim().is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Format `time` in `tz` using a strftime-style `format` and `locale` names.
///
/// An empty format uses [`DEFAULT_DATE_FORMAT`]; an invalid one is logged and
/// replaced by it. Some locales expand `%c`, `%x` and `%X` into patterns chrono
/// cannot print; those also fall back to the default format.
pub fn format_date(time: OffsetDateTime, tz: Tz, format: &str, locale: Locale) -> String {
    let format = if format.trim().is_empty() {
        DEFAULT_DATE_FORMAT
    } else if is_valid_date_format(format) {
        format
    } else {
        warn!(
            target = "util::locale",
            format,
            "invalid date format; using default"
        );
        DEFAULT_DATE_FORMAT
    };

    let local = localized_datetime(time, tz);
    if let Some(formatted) = try_format(&local, format, locale) {
        return formatted;
    }

    warn!(
        target = "util::locale",
        format,
        locale = ?locale,
        "date format not printable in locale; using default"
    );
    try_format(&local, DEFAULT_DATE_FORMAT, locale)
        .or_else(|| try_format(&local, DEFAULT_DATE_FORMAT, Locale::POSIX))
        .unwrap_or_default()
}

fn try_format(local: &DateTime<Tz>, format: &str, locale: Locale) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", local.format_localized(format, locale)).ok()?;
    Some(out)
}
