//! Markdown rendering core for a multi-tenant blog host.
//!
//! [`application::render::RenderPipeline`] turns an author's markdown into
//! display HTML: preprocessing, CommonMark/GFM rendering with math and
//! highlighting hooks, tier-based sanitisation and `{{ … }}` directive
//! expansion.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
