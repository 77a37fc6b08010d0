pub mod domain_policy;
pub mod link_rewriter;
pub mod reddit_video_resolver;
pub mod url_extractor;

pub use domain_policy::{DomainPolicy, DomainRule, REDDIT_SHORT_LINK_HOST, RuleKind};
pub use link_rewriter::LinkRewriter;
pub use reddit_video_resolver::{
    REDDIT_BASE_URL, RedditVideoResolver, ResolverSettings, ShortLinkStrategy, post_json_url,
    short_link_id,
};
pub use url_extractor::{CandidateUrl, Candidates, UrlExtractor};
