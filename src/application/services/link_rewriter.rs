//! Per-message rewrite pipeline.

use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use super::domain_policy::{DomainPolicy, DomainRule, REDDIT_SHORT_LINK_HOST, RuleKind};
use super::reddit_video_resolver::{RedditVideoResolver, short_link_id};
use super::url_extractor::{CandidateUrl, UrlExtractor};
use crate::domain::entities::{RedirectResolution, RewriteResult};

/// Runs extraction, rule matching and Reddit classification over one message.
#[derive(Clone)]
pub struct LinkRewriter {
    policy: Arc<DomainPolicy>,
    resolver: RedditVideoResolver,
}

impl LinkRewriter {
    #[must_use]
    pub fn new(policy: Arc<DomainPolicy>, resolver: RedditVideoResolver) -> Self {
        Self { policy, resolver }
    }

    /// Rewrites every eligible link in `content`.
    ///
    /// Candidates are handled one at a time in order of appearance. A
    /// candidate that fails classification is dropped and the rest are
    /// still processed.
    pub async fn rewrite(&self, content: &str) -> RewriteResult {
        let mut result = RewriteResult::new();

        for candidate in UrlExtractor::candidates(content) {
            let Some(rule) = self.policy.match_candidate(&candidate) else {
                debug!(url = %candidate.matched, domain = %candidate.domain, "No rule matched");
                continue;
            };

            match rule.kind() {
                RuleKind::Plain => Self::rewrite_plain(&candidate, rule, &mut result),
                RuleKind::SuppressNativeEmbed => {
                    Self::rewrite_plain(&candidate, rule, &mut result);
                    result.request_suppression();
                }
                RuleKind::RedditPost => self.rewrite_reddit_post(&candidate, rule, &mut result).await,
                RuleKind::RedditShortLink
                    if candidate.url.host_str() == Some(REDDIT_SHORT_LINK_HOST) =>
                {
                    self.rewrite_short_link(&candidate, rule, &mut result).await;
                }
                RuleKind::RedditShortLink => Self::rewrite_plain(&candidate, rule, &mut result),
            }
        }

        result
    }

    fn rewrite_plain(candidate: &CandidateUrl, rule: &DomainRule, result: &mut RewriteResult) {
        if let Some(link) = with_host(&candidate.url, rule.target_host()) {
            debug!(url = %candidate.matched, rewritten = %link, "Rewrote link");
            result.push(link);
        }
    }

    async fn rewrite_reddit_post(
        &self,
        candidate: &CandidateUrl,
        rule: &DomainRule,
        result: &mut RewriteResult,
    ) {
        match self
            .resolver
            .classify_post(&candidate.url, &candidate.matched)
            .await
        {
            Ok(verdict) if verdict.is_video() => {
                Self::rewrite_plain(candidate, rule, result);
                result.mark_reddit_video();
            }
            Ok(_) => debug!(url = %candidate.matched, "Reddit post is not a video"),
            Err(e) => warn!(url = %candidate.matched, error = %e, "Error classifying Reddit post"),
        }
    }

    async fn rewrite_short_link(
        &self,
        candidate: &CandidateUrl,
        rule: &DomainRule,
        result: &mut RewriteResult,
    ) {
        let Some(id) = short_link_id(&candidate.url) else {
            debug!(url = %candidate.matched, "Short link has no video id");
            return;
        };

        match self.resolver.resolve_short_link(&candidate.url, id).await {
            Ok(RedirectResolution::Resolved(post)) => {
                if let Some(link) = with_host(&post, rule.target_host()) {
                    debug!(url = %candidate.matched, rewritten = %link, "Rewrote short link");
                    result.push(link);
                    result.mark_reddit_video();
                }
            }
            Ok(RedirectResolution::Empty) => {
                debug!(url = %candidate.matched, "Short link resolved to nothing");
            }
            Err(e) => warn!(url = %candidate.matched, error = %e, "Error resolving short link"),
        }
    }
}

fn with_host(url: &Url, host: &str) -> Option<String> {
    let mut rewritten = url.clone();
    match rewritten.set_host(Some(host)) {
        Ok(()) => Some(rewritten.into()),
        Err(e) => {
            warn!(url = %url, host, error = %e, "Error replacing host");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::ResolverSettings;
    use crate::domain::entities::CachedValue;
    use crate::domain::ports::UpstreamResponse;
    use crate::domain::ports::mocks::{MockResultCache, MockUpstream};

    const REDDIT_POST: &str = "https://www.reddit.com/r/videos/comments/abc/clip/";
    const REDDIT_POST_JSON: &str = "https://www.reddit.com/r/videos/comments/abc/clip.json";
    const VIDEO_BODY: &str = r#"[{"kind": "Listing", "data": {"children": [{"kind": "t3", "data": {
        "media": {"reddit_video": {"fallback_url": "https://v.redd.it/abc/DASH_720.mp4"}}
    }}]}}]"#;

    fn rewriter(upstream: &Arc<MockUpstream>, cache: &Arc<MockResultCache>) -> LinkRewriter {
        let resolver = RedditVideoResolver::new(
            upstream.clone(),
            cache.clone(),
            ResolverSettings::default(),
        );
        LinkRewriter::new(Arc::new(DomainPolicy::builtin()), resolver)
    }

    fn offline() -> (Arc<MockUpstream>, LinkRewriter) {
        let upstream = Arc::new(MockUpstream::new());
        let rewriter = rewriter(&upstream, &Arc::new(MockResultCache::new()));
        (upstream, rewriter)
    }

    #[tokio::test]
    async fn test_no_links() {
        let (upstream, rewriter) = offline();

        let result = rewriter.rewrite("nothing to see here").await;

        assert!(result.is_empty());
        assert!(!result.should_suppress_native_embed());
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_instagram_rewrite() {
        let (_, rewriter) = offline();

        let result = rewriter
            .rewrite("https://instagram.com/p/abc123?igsh=xyz")
            .await;

        assert_eq!(result.links(), ["https://ddinstagram.com/p/abc123?igsh=xyz"]);
        assert!(!result.should_suppress_native_embed());
    }

    #[tokio::test]
    async fn test_tiktok_requests_suppression() {
        let (upstream, rewriter) = offline();

        let result = rewriter.rewrite("https://tiktok.com/video/123").await;

        assert_eq!(result.links(), ["https://vxtiktok.com/video/123"]);
        assert!(result.should_suppress_native_embed());
        assert!(!result.includes_reddit_video());
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_order_preserved() {
        let (_, rewriter) = offline();

        let result = rewriter
            .rewrite("see https://instagram.com/p/a then https://tiktok.com/video/b")
            .await;

        assert_eq!(
            result.links(),
            ["https://ddinstagram.com/p/a", "https://vxtiktok.com/video/b"]
        );
    }

    #[tokio::test]
    async fn test_unknown_domain_no_upstream_call() {
        let (upstream, rewriter) = offline();

        let result = rewriter
            .rewrite("https://twitter.com/a/status/1 https://youtube.com/watch?v=x")
            .await;

        assert!(result.is_empty());
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_ineligible_path_dropped() {
        let (_, rewriter) = offline();

        let result = rewriter.rewrite("https://instagram.com/reels/abc").await;

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_link_collapsed() {
        let (_, rewriter) = offline();

        let result = rewriter
            .rewrite("https://instagram.com/p/a and again https://instagram.com/p/a")
            .await;

        assert_eq!(result.links().len(), 1);
    }

    #[tokio::test]
    async fn test_reddit_video_rewritten_once_per_lookup() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            REDDIT_POST_JSON,
            UpstreamResponse::new(200, VIDEO_BODY),
        ));
        let cache = Arc::new(MockResultCache::new());
        let rewriter = rewriter(&upstream, &cache);

        let first = rewriter.rewrite(REDDIT_POST).await;
        let second = rewriter.rewrite(REDDIT_POST).await;

        assert_eq!(
            first.links(),
            ["https://rxddit.com/r/videos/comments/abc/clip/"]
        );
        assert!(first.includes_reddit_video());
        assert!(first.should_suppress_native_embed());
        assert_eq!(second, first);
        assert_eq!(upstream.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cached_negative_dropped_without_call() {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(MockResultCache::with_entry(
            REDDIT_POST,
            CachedValue::Verdict(false),
        ));
        let rewriter = rewriter(&upstream, &cache);

        let result = rewriter.rewrite(REDDIT_POST).await;

        assert!(result.is_empty());
        assert_eq!(upstream.call_count(), 0);
    }

    #[tokio::test]
    async fn test_classification_error_skips_only_that_link() {
        let upstream = Arc::new(MockUpstream::new().with_network_error(REDDIT_POST_JSON));
        let rewriter = rewriter(&upstream, &Arc::new(MockResultCache::new()));

        let result = rewriter
            .rewrite(&format!("{REDDIT_POST} https://instagram.com/p/a"))
            .await;

        assert_eq!(result.links(), ["https://ddinstagram.com/p/a"]);
        assert!(!result.should_suppress_native_embed());
    }

    #[tokio::test]
    async fn test_short_link_resolved() {
        let upstream = Arc::new(MockUpstream::new().with_response(
            "https://www.reddit.com/video/xyz",
            UpstreamResponse::redirect(301, REDDIT_POST),
        ));
        let rewriter = rewriter(&upstream, &Arc::new(MockResultCache::new()));

        let result = rewriter.rewrite("https://v.redd.it/xyz").await;

        assert_eq!(
            result.links(),
            ["https://rxddit.com/r/videos/comments/abc/clip/"]
        );
        assert!(result.includes_reddit_video());
    }

    #[tokio::test]
    async fn test_short_link_empty_dropped_and_cached() {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(MockResultCache::new());
        let rewriter = rewriter(&upstream, &cache);

        let first = rewriter.rewrite("https://v.redd.it/xyz").await;
        let second = rewriter.rewrite("https://v.redd.it/xyz").await;

        assert!(first.is_empty());
        assert!(second.is_empty());
        assert_eq!(upstream.call_count(), 1);
        assert_eq!(cache.peek("xyz"), Some(CachedValue::Redirect(String::new())));
    }

    #[tokio::test]
    async fn test_other_redd_it_host_is_plain() {
        let (upstream, rewriter) = offline();

        let result = rewriter.rewrite("https://i.redd.it/picture.jpg").await;

        assert_eq!(result.links(), ["https://rxddit.com/picture.jpg"]);
        assert_eq!(upstream.call_count(), 0);
    }
}
