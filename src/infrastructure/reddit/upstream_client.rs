//! Reddit content API HTTP client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header};
use tracing::{debug, trace};
use url::Url;

use super::oauth::{RedditCredentials, RedditTokenProvider};
use crate::domain::entities::Secret;
use crate::domain::errors::ClassificationError;
use crate::domain::ports::{UpstreamHttpPort, UpstreamResponse};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings shared by both clients.
#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Upstream adapter owning one redirect-following client and one that never
/// follows redirects.
pub struct RedditHttpClient {
    client: Client,
    no_redirect: Client,
    accept_language: String,
    tokens: Option<Arc<RedditTokenProvider>>,
}

impl RedditHttpClient {
    /// Creates the adapter. Requests are authenticated when `credentials`
    /// are given and anonymous otherwise.
    ///
    /// # Errors
    /// Returns error if an HTTP client cannot be built.
    pub fn new(
        config: &UpstreamClientConfig,
        credentials: Option<RedditCredentials>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        let no_redirect = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        let tokens = credentials.map(|credentials| {
            debug!(username = %credentials.username, "Using authenticated Reddit requests");
            Arc::new(RedditTokenProvider::new(client.clone(), credentials))
        });

        Ok(Self {
            client,
            no_redirect,
            accept_language: config.accept_language.clone(),
            tokens,
        })
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ClassificationError> {
        let token = match &self.tokens {
            Some(tokens) => Some(tokens.bearer_token().await?),
            None => None,
        };

        self.decorate(request, token.as_ref())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassificationError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    ClassificationError::network(url.as_str(), e.to_string())
                }
            })
    }

    /// Adds the per-request headers. The User-Agent is a client default.
    fn decorate(&self, request: RequestBuilder, token: Option<&Secret>) -> RequestBuilder {
        let request = request.header(header::ACCEPT_LANGUAGE, &self.accept_language);
        match token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }
}

fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl UpstreamHttpPort for RedditHttpClient {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, ClassificationError> {
        trace!(url = %url, "GET");

        let response = self.send(self.client.get(url.clone()), url).await?;
        let status = response.status().as_u16();
        let location = location(&response);
        let body = response
            .text()
            .await
            .map_err(|e| ClassificationError::decode(url.as_str(), e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            location,
            body,
        })
    }

    async fn head_without_redirect(
        &self,
        url: &Url,
    ) -> Result<UpstreamResponse, ClassificationError> {
        trace!(url = %url, "HEAD");

        let response = self.send(self.no_redirect.head(url.clone()), url).await?;
        let status = response.status().as_u16();
        let location = location(&response);

        debug!(url = %url, status, location = ?location, "Redirect lookup");

        Ok(UpstreamResponse {
            status,
            location,
            body: String::new(),
        })
    }
}
