//! Application layer: the link rewrite pipeline and the message handler.

/// Data transfer objects.
pub mod dto;
/// Rewrite pipeline services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{DomainPolicy, LinkRewriter, RedditVideoResolver, ResolverSettings};
pub use use_cases::{HandleMessageUseCase, HandleOutcome};
