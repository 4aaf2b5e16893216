use std::{
    io::{self, Read},
    path::Path,
    process,
};

use inkpost::{
    application::{
        error::AppError,
        render::{RenderPipelineConfig, configure_render_pipeline, render_pipeline},
    },
    config::{self, ExcerptArgs, RenderArgs, SanitizeArgs},
    domain::{
        context::{BlogSettings, RenderContext},
        error::DomainError,
    },
    infra::{error::InfraError, telemetry},
};
use time::OffsetDateTime;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    let report = error.report();
    if dispatcher::has_been_set() {
        error!(error = %report.render(), source = report.source, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %report.render(), source = report.source, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    configure_render_pipeline(RenderPipelineConfig::from(&settings.render))
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    match cli_args.command {
        config::Command::Render(args) => run_render(args),
        config::Command::Excerpt(args) => run_excerpt(args),
        config::Command::Sanitize(args) => run_sanitize(args),
    }
}

fn run_render(args: RenderArgs) -> Result<(), AppError> {
    let markdown = read_input(&args.input)?;
    let mut context = match args.context.as_deref() {
        Some(path) => load_context(path)?,
        None => standalone_context(),
    };
    context.raw_content = markdown;
    if let Some(tier) = args.tier {
        context.account_tier = tier;
    }

    let output = render_pipeline().render(&context);
    info!(
        target = "inkpost::render",
        tier = ?context.account_tier,
        html_bytes = output.html.len(),
        "rendered document"
    );

    if args.json {
        let json = serde_json::to_string_pretty(&output)
            .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))?;
        println!("{json}");
    } else {
        print!("{}", output.html);
    }
    Ok(())
}

fn run_excerpt(args: ExcerptArgs) -> Result<(), AppError> {
    let markdown = read_input(&args.input)?;
    println!("{}", render_pipeline().excerpt(&markdown));
    Ok(())
}

fn run_sanitize(args: SanitizeArgs) -> Result<(), AppError> {
    let html = read_input(&args.input)?;
    let clean = render_pipeline()
        .sanitizer()
        .try_sanitize(&html)
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    print!("{clean}");
    Ok(())
}

fn read_input(path: &Path) -> Result<String, AppError> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| InfraError::read_input(path, err))?;
        buffer
    } else {
        std::fs::read_to_string(path).map_err(|err| InfraError::read_input(path, err))?
    };
    Ok(content)
}

/// Read a render context from a `.json` or `.toml` file.
fn load_context(path: &Path) -> Result<RenderContext, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|err| InfraError::read_input(path, err))?;
    parse_context(path, &raw)
}

fn parse_context(path: &Path, raw: &str) -> Result<RenderContext, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::validation(format!(
            "context file `{}` is empty",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let context: RenderContext = match extension.as_deref() {
        Some("json") => serde_json::from_str(raw).map_err(|err| {
            DomainError::invalid_context(format!("`{}`: {err}", path.display()))
        })?,
        Some("toml") => toml::from_str(raw).map_err(|err| {
            DomainError::invalid_context(format!("`{}`: {err}", path.display()))
        })?,
        _ => {
            return Err(DomainError::invalid_context(format!(
                "`{}` must be a .json or .toml file",
                path.display()
            ))
            .into());
        }
    };
    Ok(context)
}

/// Context for rendering a loose markdown file with no blog around it.
fn standalone_context() -> RenderContext {
    let now = OffsetDateTime::now_utc();
    let blog = BlogSettings {
        title: String::new(),
        description: String::new(),
        created_at: now,
        last_modified: now,
        last_post_at: None,
        link: String::new(),
        date_format: String::new(),
        language_code: "en".to_string(),
    };
    RenderContext::new(String::new(), blog, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_file_is_a_validation_error() {
        let err = parse_context(Path::new("blog.json"), "  \n").expect_err("empty context");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn context_extension_must_be_known() {
        let err = parse_context(Path::new("blog.yaml"), "title: x").expect_err("yaml context");
        assert!(matches!(err, AppError::Domain(DomainError::InvalidContext { .. })));
    }

    #[test]
    fn fixture_context_parses() {
        let raw = include_str!("../tests/fixtures/blog_context.json");
        let context = parse_context(Path::new("blog_context.json"), raw).expect("context");
        assert_eq!(context.blog.title, "Field Notes");
    }
}
