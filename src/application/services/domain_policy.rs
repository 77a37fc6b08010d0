//! Domain rewrite rules.

use std::collections::HashMap;

use regex::Regex;

use super::url_extractor::CandidateUrl;

/// Host serving Reddit short links.
pub const REDDIT_SHORT_LINK_HOST: &str = "v.redd.it";

/// Domain-specific handling applied after a rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Rewrite the host, nothing else.
    Plain,
    /// Rewrite and always suppress the native embed.
    SuppressNativeEmbed,
    /// Rewrite only Reddit posts that carry a video.
    RedditPost,
    /// Resolve `v.redd.it` short links to their post first. Other hosts
    /// under the domain are treated as [`RuleKind::Plain`].
    RedditShortLink,
}

/// Replacement host and eligible paths for one registrable domain.
#[derive(Debug, Clone)]
pub struct DomainRule {
    target_host: String,
    required_paths: Vec<Regex>,
    kind: RuleKind,
}

impl DomainRule {
    /// Creates a rule. Patterns are tried in the given order.
    ///
    /// # Errors
    /// Returns error if a pattern is not a valid regular expression.
    pub fn new(
        target_host: impl Into<String>,
        patterns: &[&str],
        kind: RuleKind,
    ) -> Result<Self, regex::Error> {
        let required_paths = patterns
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            target_host: target_host.into(),
            required_paths,
            kind,
        })
    }

    #[must_use]
    pub fn target_host(&self) -> &str {
        &self.target_host
    }

    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        self.kind
    }

    /// Returns the index of the first pattern matching `path`.
    #[must_use]
    pub fn matching_pattern(&self, path: &str) -> Option<usize> {
        self.required_paths
            .iter()
            .position(|pattern| pattern.is_match(path))
    }
}

/// Immutable table of rewrite rules keyed by registrable domain.
#[derive(Debug, Clone, Default)]
pub struct DomainPolicy {
    rules: HashMap<String, DomainRule>,
}

impl DomainPolicy {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table of supported sites.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_rule(
                "instagram.com",
                builtin_rule("ddinstagram.com", &[r"/p/"], RuleKind::Plain),
            )
            .with_rule(
                "tiktok.com",
                builtin_rule(
                    "vxtiktok.com",
                    &[r"/t/", r"/video/"],
                    RuleKind::SuppressNativeEmbed,
                ),
            )
            .with_rule(
                "reddit.com",
                builtin_rule("rxddit.com", &[r"/r/"], RuleKind::RedditPost),
            )
            .with_rule(
                "redd.it",
                builtin_rule("rxddit.com", &[r".*"], RuleKind::RedditShortLink),
            )
    }

    #[must_use]
    pub fn with_rule(mut self, domain: impl Into<String>, rule: DomainRule) -> Self {
        self.rules.insert(domain.into(), rule);
        self
    }

    /// Exact lookup on a registrable domain.
    #[must_use]
    pub fn lookup(&self, domain: &str) -> Option<&DomainRule> {
        self.rules.get(domain)
    }

    /// Returns the rule for `candidate` if both its domain and path are eligible.
    #[must_use]
    pub fn match_candidate(&self, candidate: &CandidateUrl) -> Option<&DomainRule> {
        let rule = self.lookup(&candidate.domain)?;
        rule.matching_pattern(candidate.url.path()).map(|_| rule)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[allow(clippy::expect_used)]
fn builtin_rule(target_host: &str, patterns: &[&str], kind: RuleKind) -> DomainRule {
    DomainRule::new(target_host, patterns, kind).expect("built-in path patterns are valid")
}
