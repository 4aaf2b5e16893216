use std::{sync::Arc, time::Instant};

use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::instrument;

use crate::domain::context::{AccountTier, RenderContext, SanitizationPolicy};
use crate::util::{locale::DEFAULT_DATE_FORMAT, timezone::resolve_timezone};

use super::directives::{self, DirectiveEnv};
use super::excerpt::{DEFAULT_EXCERPT_LENGTH, excerpt};
use super::preprocess::{escape_nested_parens, normalize_latex};
use super::sanitize::Sanitizer;
use super::service::MarkdownRenderer;
use super::types::{EmbeddedRenderer, RenderOutput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPipelineConfig {
    /// Used when a blog has no date format of its own.
    pub default_date_format: String,
    /// Used when a render context names no timezone.
    pub default_timezone: String,
    pub excerpt_length: usize,
    pub extra_iframe_hosts: Vec<String>,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            default_date_format: DEFAULT_DATE_FORMAT.to_string(),
            default_timezone: "UTC".to_string(),
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            extra_iframe_hosts: Vec::new(),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            default_date_format: settings.default_date_format.clone(),
            default_timezone: settings.default_timezone.clone(),
            excerpt_length: settings.excerpt_length,
            extra_iframe_hosts: settings.extra_iframe_hosts.clone(),
        }
    }
}

/// Markdown in, tier-appropriate HTML with directives expanded out.
///
/// Stateless between calls; one instance serves any number of threads.
pub struct RenderPipeline {
    renderer: MarkdownRenderer,
    sanitizer: Sanitizer,
    config: RenderPipelineConfig,
}

impl RenderPipeline {
    pub fn new(config: RenderPipelineConfig) -> Self {
        let sanitizer = Sanitizer::new().with_extra_iframe_hosts(config.extra_iframe_hosts.clone());
        Self {
            renderer: MarkdownRenderer::standard(),
            sanitizer,
            config,
        }
    }

    pub fn config(&self) -> &RenderPipelineConfig {
        &self.config
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// Render `context.raw_content` for display. Never fails: broken
    /// fragments degrade to empty output and are logged where they occur.
    #[instrument(
        name = "render",
        skip_all,
        fields(tier = ?context.account_tier, has_post = context.post.is_some())
    )]
    pub fn render(&self, context: &RenderContext) -> RenderOutput {
        metrics::counter!("inkpost_render_total").increment(1);
        let started = Instant::now();

        let body = self.render_body(&context.raw_content, context.account_tier);

        let embedded = EmbeddedBodies {
            pipeline: self,
            tier: context.account_tier,
        };
        let env = DirectiveEnv::new(context, &embedded)
            .with_default_date_format(&self.config.default_date_format)
            .with_timezone(self.timezone_for(context));
        let html = directives::expand(&body, &env);
        let excerpt = self.excerpt(&context.raw_content);

        metrics::histogram!("inkpost_render_ms").record(started.elapsed().as_secs_f64() * 1000.0);
        RenderOutput { html, excerpt }
    }

    /// Preprocess, render and (for free accounts) sanitise, without
    /// directive expansion.
    pub fn render_body(&self, markdown: &str, tier: AccountTier) -> String {
        let prepared = normalize_latex(&escape_nested_parens(markdown));
        let html = self.renderer.render(&prepared);
        match tier.sanitization() {
            SanitizationPolicy::Sanitize => self.sanitizer.sanitize(&html),
            SanitizationPolicy::PassThrough => html,
        }
    }

    pub fn excerpt(&self, markdown: &str) -> String {
        excerpt(markdown, self.config.excerpt_length)
    }

    fn timezone_for(&self, context: &RenderContext) -> chrono_tz::Tz {
        if context.timezone_name.trim().is_empty() {
            resolve_timezone(&self.config.default_timezone)
        } else {
            resolve_timezone(&context.timezone_name)
        }
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(RenderPipelineConfig::default())
    }
}

/// Post bodies embedded by `{{ posts content:True }}`: rendered and
/// sanitised with the host's tier, but never directive-expanded.
struct EmbeddedBodies<'a> {
    pipeline: &'a RenderPipeline,
    tier: AccountTier,
}

impl EmbeddedRenderer for EmbeddedBodies<'_> {
    fn render_embedded(&self, markdown: &str) -> String {
        self.pipeline.render_body(markdown, self.tier)
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render pipeline already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

static RENDER_PIPELINE: Lazy<Arc<RenderPipeline>> =
    Lazy::new(|| Arc::new(RenderPipeline::new(active_render_config())));

/// Set the configuration of the shared pipeline. Must happen before the
/// first call to [`render_pipeline`] to take effect.
pub fn configure_render_pipeline(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

/// Access the shared pipeline, initialised on first use.
pub fn render_pipeline() -> Arc<RenderPipeline> {
    Arc::clone(&RENDER_PIPELINE)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}
