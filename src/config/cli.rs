use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::context::AccountTier;

/// Command-line arguments for the inkpost binary.
#[derive(Debug, Parser)]
#[command(name = "inkpost", version, about = "Render blog markdown to HTML")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "INKPOST_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a markdown file through the full pipeline and print the HTML.
    Render(RenderArgs),
    /// Print the plain-text excerpt of a markdown file.
    Excerpt(ExcerptArgs),
    /// Run the free-tier sanitiser over an HTML file.
    Sanitize(SanitizeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the fallback strftime date format.
    #[arg(long = "render-date-format", value_name = "FORMAT")]
    pub default_date_format: Option<String>,

    /// Override the timezone used when a context names none.
    #[arg(long = "render-timezone", value_name = "TZ")]
    pub default_timezone: Option<String>,

    /// Override the excerpt length in characters.
    #[arg(long = "render-excerpt-length", value_name = "CHARS")]
    pub excerpt_length: Option<usize>,

    /// Additional iframe host allowed by the sanitiser (repeatable).
    #[arg(long = "render-iframe-host", value_name = "HOST")]
    pub extra_iframe_hosts: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Markdown file to render; `-` reads stdin.
    #[arg(value_name = "MARKDOWN", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Render context as JSON or TOML (blog settings, post, posts).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub context: Option<PathBuf>,

    /// Account tier, overriding the one in the context.
    #[arg(long, value_name = "TIER")]
    pub tier: Option<AccountTier>,

    /// Print `{ "html", "excerpt" }` as JSON instead of bare HTML.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct ExcerptArgs {
    /// Markdown file to summarise; `-` reads stdin.
    #[arg(value_name = "MARKDOWN", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Maximum excerpt length in characters, before the suffix.
    #[arg(long, value_name = "CHARS")]
    pub length: Option<usize>,
}

#[derive(Debug, Args, Clone)]
pub struct SanitizeArgs {
    /// HTML file to sanitise; `-` reads stdin.
    #[arg(value_name = "HTML", value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    #[command(flatten)]
    pub overrides: RenderOverrides,
}
