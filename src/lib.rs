//! embedfix - a Discord bot that reposts social media links with working embeds.
//!
//! Instagram and TikTok links are rewritten to embed-friendly mirrors. Reddit
//! links are only rewritten when the post holds a native video, which is
//! looked up once and cached.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the rewrite pipeline and message handling.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "embedfix";
