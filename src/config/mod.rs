//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::str::FromStr;

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::render::DEFAULT_EXCERPT_LENGTH;
use crate::util::locale::{DEFAULT_DATE_FORMAT, is_valid_date_format};

mod cli;

pub use cli::{
    CliArgs, Command, ExcerptArgs, LoggingOverrides, RenderArgs, RenderOverrides, SanitizeArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "inkpost";
const ENV_PREFIX: &str = "INKPOST";
const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub default_date_format: String,
    pub default_timezone: String,
    pub excerpt_length: usize,
    /// Hosts allowed in free-tier iframes on top of the built-in list.
    pub extra_iframe_hosts: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("render.extra_iframe_hosts")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_logging_overrides(&cli.logging);
    match &cli.command {
        Command::Render(args) => raw.apply_render_overrides(&args.overrides),
        Command::Sanitize(args) => raw.apply_render_overrides(&args.overrides),
        Command::Excerpt(args) => {
            if let Some(length) = args.length {
                raw.render.excerpt_length = Some(length);
            }
        }
    }

    Settings::from_raw(raw)
}

/// Parse CLI arguments and load settings in one step.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let cli = CliArgs::parse();
    let settings = load(&cli)?;
    Ok((cli, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    default_date_format: Option<String>,
    default_timezone: Option<String>,
    excerpt_length: Option<usize>,
    extra_iframe_hosts: Option<Vec<String>>,
}

impl RawSettings {
    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(format) = overrides.default_date_format.as_ref() {
            self.render.default_date_format = Some(format.clone());
        }
        if let Some(timezone) = overrides.default_timezone.as_ref() {
            self.render.default_timezone = Some(timezone.clone());
        }
        if let Some(length) = overrides.excerpt_length {
            self.render.excerpt_length = Some(length);
        }
        if !overrides.extra_iframe_hosts.is_empty() {
            self.render
                .extra_iframe_hosts
                .get_or_insert_with(Vec::new)
                .extend(overrides.extra_iframe_hosts.iter().cloned());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, render } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;

        Ok(Self { logging, render })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let default_date_format = trimmed_or(render.default_date_format, DEFAULT_DATE_FORMAT);
    if !is_valid_date_format(&default_date_format) {
        return Err(LoadError::invalid(
            "render.default_date_format",
            format!("`{default_date_format}` is not a valid strftime format"),
        ));
    }

    let default_timezone = trimmed_or(render.default_timezone, DEFAULT_TIMEZONE);
    if Tz::from_str(&default_timezone).is_err() {
        return Err(LoadError::invalid(
            "render.default_timezone",
            format!("unknown timezone `{default_timezone}`"),
        ));
    }

    let excerpt_length = render.excerpt_length.unwrap_or(DEFAULT_EXCERPT_LENGTH);
    if excerpt_length == 0 {
        return Err(LoadError::invalid(
            "render.excerpt_length",
            "must be greater than zero",
        ));
    }

    let mut extra_iframe_hosts = Vec::new();
    for host in render.extra_iframe_hosts.unwrap_or_default() {
        let host = host.trim().to_ascii_lowercase();
        if host.is_empty() {
            continue;
        }
        if host.contains("://") {
            return Err(LoadError::invalid(
                "render.extra_iframe_hosts",
                format!("`{host}` must be a host with an optional path, without a scheme"),
            ));
        }
        if !extra_iframe_hosts.contains(&host) {
            extra_iframe_hosts.push(host);
        }
    }

    Ok(RenderSettings {
        default_date_format,
        default_timezone,
        excerpt_length,
        extra_iframe_hosts,
    })
}

fn trimmed_or(value: Option<String>, fallback: &str) -> String {
    value
        .and_then(|value| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| fallback.to_string())
}
