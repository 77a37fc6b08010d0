//! Reddit content API adapter.

mod oauth;
mod upstream_client;

pub use oauth::{RedditAuthError, RedditCredentials, RedditTokenProvider, TOKEN_URL};
pub use upstream_client::{
    DEFAULT_ACCEPT_LANGUAGE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, RedditHttpClient,
    UpstreamClientConfig,
};
