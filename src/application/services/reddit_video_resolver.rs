//! Reddit video detection and short-link resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::application::dto::{PostData, RedditListing};
use crate::domain::entities::{CachedValue, RedirectResolution, VideoVerdict};
use crate::domain::errors::ClassificationError;
use crate::domain::ports::{ResultCachePort, UpstreamHttpPort, UpstreamResponse};

/// Base URL of the Reddit content API.
pub const REDDIT_BASE_URL: &str = "https://www.reddit.com";

const ENTRY_COST: u64 = 1;

/// How `v.redd.it` short links are turned into post URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShortLinkStrategy {
    /// `HEAD /video/{id}` and read the `Location` header.
    #[default]
    Redirect,
    /// Search for the short link and take the first result's permalink.
    Search,
}

impl std::fmt::Display for ShortLinkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redirect => write!(f, "redirect"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Tunables for [`RedditVideoResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    pub short_link_strategy: ShortLinkStrategy,
    /// Cache "not a video" verdicts as well as positive ones.
    pub cache_negative_verdicts: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            short_link_strategy: ShortLinkStrategy::default(),
            cache_negative_verdicts: true,
        }
    }
}

/// Decides whether Reddit links point at videos, backed by the result cache.
#[derive(Clone)]
pub struct RedditVideoResolver {
    upstream: Arc<dyn UpstreamHttpPort>,
    cache: Arc<dyn ResultCachePort>,
    settings: ResolverSettings,
}

impl RedditVideoResolver {
    #[must_use]
    pub fn new(
        upstream: Arc<dyn UpstreamHttpPort>,
        cache: Arc<dyn ResultCachePort>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            upstream,
            cache,
            settings,
        }
    }

    /// Classifies a `reddit.com/r/...` post.
    ///
    /// `cache_key` is the link as it appeared in the message.
    ///
    /// # Errors
    /// Returns error if the post JSON cannot be fetched or decoded.
    pub async fn classify_post(
        &self,
        url: &Url,
        cache_key: &str,
    ) -> Result<VideoVerdict, ClassificationError> {
        if let Some(CachedValue::Verdict(is_video)) = self.cache.get(cache_key) {
            debug!(key = cache_key, is_video, "Cache hit");
            return Ok(VideoVerdict::from_cached(is_video));
        }

        let json_url = post_json_url(url)?;
        let response = self.upstream.get(&json_url).await?;
        ensure_ok(&json_url, &response)?;

        let listings: Vec<RedditListing> = serde_json::from_str(&response.body)
            .map_err(|e| ClassificationError::decode(json_url.as_str(), e.to_string()))?;

        let is_video = listings
            .iter()
            .flat_map(RedditListing::posts)
            .any(PostData::has_reddit_video);

        debug!(url = %url, is_video, "Classified Reddit post");

        if is_video || self.settings.cache_negative_verdicts {
            self.store(cache_key, CachedValue::Verdict(is_video));
        }

        Ok(VideoVerdict::from_cached(is_video))
    }

    /// Resolves a `v.redd.it/{id}` short link to the post it belongs to.
    ///
    /// Empty outcomes are cached so the same id is not looked up again;
    /// errors are not.
    ///
    /// # Errors
    /// Returns error if the lookup request fails.
    pub async fn resolve_short_link(
        &self,
        url: &Url,
        id: &str,
    ) -> Result<RedirectResolution, ClassificationError> {
        match self.cache.get(id) {
            Some(CachedValue::Redirect(cached)) if cached.is_empty() => {
                debug!(id, "Cache hit, previous lookup found nothing");
                return Ok(RedirectResolution::Empty);
            }
            Some(CachedValue::Redirect(cached)) => match Url::parse(&cached) {
                Ok(resolved) => {
                    debug!(id, url = %resolved, "Cache hit");
                    return Ok(RedirectResolution::Resolved(resolved));
                }
                Err(e) => warn!(id, error = %e, "Ignoring unparsable cached redirect"),
            },
            _ => {}
        }

        let resolution = match self.settings.short_link_strategy {
            ShortLinkStrategy::Redirect => self.resolve_via_redirect(id).await?,
            ShortLinkStrategy::Search => self.resolve_via_search(url).await?,
        };

        debug!(id, resolution = ?resolution, "Resolved short link");
        self.store(id, CachedValue::Redirect(resolution.cache_value()));

        Ok(resolution)
    }

    async fn resolve_via_redirect(&self, id: &str) -> Result<RedirectResolution, ClassificationError> {
        let lookup = base_url()?
            .join(&format!("video/{id}"))
            .map_err(|e| ClassificationError::invalid_url(e.to_string()))?;

        let response = self.upstream.head_without_redirect(&lookup).await?;

        match response.location.as_deref().filter(|l| !l.is_empty()) {
            Some(location) => lookup
                .join(location)
                .map(RedirectResolution::Resolved)
                .map_err(|e| ClassificationError::invalid_url(format!("{location}: {e}"))),
            // Only "no such video" is a lasting answer; refusals are retried later.
            None if (200..400).contains(&response.status) || response.status == 404 => {
                Ok(RedirectResolution::Empty)
            }
            None => Err(ClassificationError::status(lookup.as_str(), response.status)),
        }
    }

    async fn resolve_via_search(&self, url: &Url) -> Result<RedirectResolution, ClassificationError> {
        let search = search_url(url)?;
        let response = self.upstream.get(&search).await?;
        ensure_ok(&search, &response)?;

        let listing: RedditListing = serde_json::from_str(&response.body)
            .map_err(|e| ClassificationError::decode(search.as_str(), e.to_string()))?;

        let Some(permalink) = listing.posts().next().and_then(PostData::canonical_permalink) else {
            return Ok(RedirectResolution::Empty);
        };

        base_url()?
            .join(permalink)
            .map(RedirectResolution::Resolved)
            .map_err(|e| ClassificationError::invalid_url(format!("{permalink}: {e}")))
    }

    fn store(&self, key: &str, value: CachedValue) {
        if !self.cache.set(key, value, ENTRY_COST) {
            warn!(key, "Failed to set cache");
        }
    }
}

/// Returns the id of a `v.redd.it/{id}` link, or `None` if the path has any
/// other shape.
#[must_use]
pub fn short_link_id(url: &Url) -> Option<&str> {
    let mut segments = url.path().split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(""), Some(id), None) if !id.is_empty() => Some(id),
        _ => None,
    }
}

/// JSON representation of a post: query and fragment dropped, trailing `/`
/// or `||` removed from the path, `.json` appended.
///
/// # Errors
/// Returns error if the URL cannot carry a path.
pub fn post_json_url(url: &Url) -> Result<Url, ClassificationError> {
    if url.cannot_be_a_base() {
        return Err(ClassificationError::invalid_url(format!("{url} has no path")));
    }

    let path = url.path();
    let path = path.strip_suffix("||").unwrap_or(path).trim_end_matches('/');

    let mut json_url = url.clone();
    json_url.set_query(None);
    json_url.set_fragment(None);
    json_url.set_path(&format!("{path}.json"));
    Ok(json_url)
}

pub(crate) fn search_url(url: &Url) -> Result<Url, ClassificationError> {
    Url::parse_with_params(
        &format!("{REDDIT_BASE_URL}/search.json"),
        &[("q", url.as_str()), ("limit", "1")],
    )
    .map_err(|e| ClassificationError::invalid_url(e.to_string()))
}

fn base_url() -> Result<Url, ClassificationError> {
    Url::parse(REDDIT_BASE_URL).map_err(|e| ClassificationError::invalid_url(e.to_string()))
}

fn ensure_ok(url: &Url, response: &UpstreamResponse) -> Result<(), ClassificationError> {
    if response.is_ok() {
        Ok(())
    } else {
        Err(ClassificationError::status(url.as_str(), response.status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::{MockResultCache, MockUpstream};

    const POST: &str = "https://www.reddit.com/r/videos/comments/abc/clip/";
    const POST_JSON: &str = "https://www.reddit.com/r/videos/comments/abc/clip.json";

    const VIDEO_BODY: &str = r#"[{"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {
        "title": "clip",
        "media": {"reddit_video": {"fallback_url": "https://v.redd.it/abc/DASH_720.mp4"}}
    }}]}}]"#;

    const TEXT_BODY: &str = r#"[{"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {
        "title": "text post", "media": null
    }}]}}]"#;

    fn resolver(
        upstream: &Arc<MockUpstream>,
        cache: &Arc<MockResultCache>,
        settings: ResolverSettings,
    ) -> RedditVideoResolver {
        RedditVideoResolver::new(upstream.clone(), cache.clone(), settings)
    }

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_post_json_url() {
        assert_eq!(post_json_url(&url(POST)).unwrap().as_str(), POST_JSON);
        assert_eq!(
            post_json_url(&url("https://reddit.com/r/a/comments/b/c?utm_source=share#x"))
                .unwrap()
                .as_str(),
            "https://reddit.com/r/a/comments/b/c.json"
        );
        assert_eq!(
            post_json_url(&url("https://reddit.com/r/a/comments/b/c/||"))
                .unwrap()
                .as_str(),
            "https://reddit.com/r/a/comments/b/c.json"
        );
    }

    #[test]
    fn test_short_link_id() {
        assert_eq!(short_link_id(&url("https://v.redd.it/xyz")), Some("xyz"));
        assert_eq!(short_link_id(&url("https://v.redd.it/")), None);
        assert_eq!(short_link_id(&url("https://v.redd.it/xyz/DASH_720.mp4")), None);
    }

    #[tokio::test]
    async fn test_video_post_is_cached() {
        let upstream = Arc::new(
            MockUpstream::new().with_response(POST_JSON, UpstreamResponse::new(200, VIDEO_BODY)),
        );
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let first = resolver.classify_post(&url(POST), POST).await.unwrap();
        let second = resolver.classify_post(&url(POST), POST).await.unwrap();

        assert_eq!(first, VideoVerdict::IsVideo);
        assert_eq!(second, first);
        assert_eq!(upstream.call_count(), 1);
        assert_eq!(cache.peek(POST), Some(CachedValue::Verdict(true)));
    }

    #[tokio::test]
    async fn test_text_post_negative_caching() {
        let upstream = Arc::new(
            MockUpstream::new().with_response(POST_JSON, UpstreamResponse::new(200, TEXT_BODY)),
        );
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let verdict = resolver.classify_post(&url(POST), POST).await.unwrap();

        assert_eq!(verdict, VideoVerdict::NotVideo);
        assert_eq!(cache.peek(POST), Some(CachedValue::Verdict(false)));
    }

    #[tokio::test]
    async fn test_negative_caching_disabled() {
        let upstream = Arc::new(
            MockUpstream::new().with_response(POST_JSON, UpstreamResponse::new(200, TEXT_BODY)),
        );
        let cache = Arc::new(MockResultCache::new());
        let settings = ResolverSettings {
            cache_negative_verdicts: false,
            ..ResolverSettings::default()
        };
        let resolver = resolver(&upstream, &cache, settings);

        resolver.classify_post(&url(POST), POST).await.unwrap();
        resolver.classify_post(&url(POST), POST).await.unwrap();

        assert_eq!(upstream.call_count(), 2);
        assert_eq!(cache.peek(POST), None);
    }

    #[tokio::test]
    async fn test_cached_negative_skips_upstream() {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(MockResultCache::with_entry(POST, CachedValue::Verdict(false)));
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let verdict = resolver.classify_post(&url(POST), POST).await.unwrap();

        assert_eq!(verdict, VideoVerdict::NotVideo);
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_non_200_is_error() {
        let upstream = Arc::new(
            MockUpstream::new().with_response(POST_JSON, UpstreamResponse::new(403, "blocked")),
        );
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let result = resolver.classify_post(&url(POST), POST).await;

        assert!(matches!(
            result,
            Err(ClassificationError::UnexpectedStatus { status: 403, .. })
        ));
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn test_decode_failure_is_error() {
        let upstream = Arc::new(
            MockUpstream::new().with_response(POST_JSON, UpstreamResponse::new(200, "<html>")),
        );
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let result = resolver.classify_post(&url(POST), POST).await;

        assert!(matches!(result, Err(ClassificationError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_cache_write_failure_keeps_verdict() {
        let upstream = Arc::new(
            MockUpstream::new().with_response(POST_JSON, UpstreamResponse::new(200, VIDEO_BODY)),
        );
        let cache = Arc::new(MockResultCache::new());
        cache.reject_writes();
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let verdict = resolver.classify_post(&url(POST), POST).await.unwrap();

        assert!(verdict.is_video());
    }

    #[tokio::test]
    async fn test_short_link_redirect() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            "https://www.reddit.com/video/xyz",
            UpstreamResponse::redirect(301, "/r/videos/comments/abc/clip/"),
        ));
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());
        let short = url("https://v.redd.it/xyz");

        let first = resolver.resolve_short_link(&short, "xyz").await.unwrap();
        let second = resolver.resolve_short_link(&short, "xyz").await.unwrap();

        assert_eq!(first, RedirectResolution::Resolved(url(POST)));
        assert_eq!(second, first);
        assert_eq!(upstream.call_count(), 1);
        assert_eq!(cache.peek("xyz"), Some(CachedValue::Redirect(POST.to_string())));
    }

    #[tokio::test]
    async fn test_short_link_without_location_is_cached_empty() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            "https://www.reddit.com/video/xyz",
            UpstreamResponse::new(404, ""),
        ));
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());
        let short = url("https://v.redd.it/xyz");

        let first = resolver.resolve_short_link(&short, "xyz").await.unwrap();
        let second = resolver.resolve_short_link(&short, "xyz").await.unwrap();

        assert_eq!(first, RedirectResolution::Empty);
        assert_eq!(second, RedirectResolution::Empty);
        assert_eq!(upstream.call_count(), 1);
        assert_eq!(cache.peek("xyz"), Some(CachedValue::Redirect(String::new())));
    }

    #[tokio::test]
    async fn test_short_link_server_error_not_cached() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            "https://www.reddit.com/video/xyz",
            UpstreamResponse::new(503, ""),
        ));
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let result = resolver
            .resolve_short_link(&url("https://v.redd.it/xyz"), "xyz")
            .await;

        assert!(result.is_err());
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn test_short_link_forbidden_not_cached() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            "https://www.reddit.com/video/xyz",
            UpstreamResponse::new(403, ""),
        ));
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());
        let short = url("https://v.redd.it/xyz");

        let first = resolver.resolve_short_link(&short, "xyz").await;
        let second = resolver.resolve_short_link(&short, "xyz").await;

        assert!(matches!(
            first,
            Err(ClassificationError::UnexpectedStatus { status: 403, .. })
        ));
        assert!(second.is_err());
        assert_eq!(upstream.call_count(), 2);
        assert_eq!(cache.writes(), 0);
        assert_eq!(cache.peek("xyz"), None);
    }

    #[tokio::test]
    async fn test_short_link_network_error_not_cached() {
        let upstream =
            Arc::new(MockUpstream::new().with_network_error("https://www.reddit.com/video/xyz"));
        let cache = Arc::new(MockResultCache::new());
        let resolver = resolver(&upstream, &cache, ResolverSettings::default());

        let result = resolver
            .resolve_short_link(&url("https://v.redd.it/xyz"), "xyz")
            .await;

        assert!(matches!(result, Err(ClassificationError::Network { .. })));
        assert_eq!(cache.writes(), 0);
    }

    #[tokio::test]
    async fn test_short_link_search_prefers_crosspost_parent() {
        let short = url("https://v.redd.it/xyz");
        let body = r#"{"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {
            "permalink": "/r/copy/comments/x/y/",
            "crosspost_parent_list": [{"permalink": "/r/videos/comments/abc/clip/"}]
        }}]}}"#;
        let upstream = Arc::new(MockUpstream::new().with_response(
            search_url(&short).unwrap().as_str(),
            UpstreamResponse::new(200, body),
        ));
        let cache = Arc::new(MockResultCache::new());
        let settings = ResolverSettings {
            short_link_strategy: ShortLinkStrategy::Search,
            ..ResolverSettings::default()
        };
        let resolver = resolver(&upstream, &cache, settings);

        let resolution = resolver.resolve_short_link(&short, "xyz").await.unwrap();

        assert_eq!(resolution, RedirectResolution::Resolved(url(POST)));
    }

    #[tokio::test]
    async fn test_short_link_search_without_results() {
        let short = url("https://v.redd.it/xyz");
        let upstream = Arc::new(MockUpstream::new().with_response(
            search_url(&short).unwrap().as_str(),
            UpstreamResponse::new(200, r#"{"kind": "Listing", "data": {"children": []}}"#),
        ));
        let cache = Arc::new(MockResultCache::new());
        let settings = ResolverSettings {
            short_link_strategy: ShortLinkStrategy::Search,
            ..ResolverSettings::default()
        };
        let resolver = resolver(&upstream, &cache, settings);

        let resolution = resolver.resolve_short_link(&short, "xyz").await.unwrap();

        assert_eq!(resolution, RedirectResolution::Empty);
        assert_eq!(cache.peek("xyz"), Some(CachedValue::Redirect(String::new())));
    }

    #[test]
    fn test_search_url_encodes_query() {
        let search = search_url(&url("https://v.redd.it/xyz")).unwrap();
        assert_eq!(search.path(), "/search.json");
        let pairs: Vec<_> = search.query_pairs().collect();
        assert_eq!(pairs[0].1, "https://v.redd.it/xyz");
        assert_eq!(pairs[1].1, "1");
    }
}
