use std::sync::LazyLock;

use regex::{Matches, Regex};
use tracing::debug;
use url::Url;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-z]{2,4}\b([-a-zA-Z0-9@:%_+.~#?&/=]*)",
    )
    .unwrap()
});

// Leftmost match wins, so `www.instagram.com` yields `instagram.com` and
// `v.redd.it` yields `redd.it`.
static REGISTRABLE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.?([^.]*(.com|.it))").unwrap());

/// A URL found in message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Exact substring matched in the message.
    pub matched: String,
    /// Parsed form of `matched`.
    pub url: Url,
    /// Registrable domain of the host, e.g. `reddit.com` for `old.reddit.com`.
    pub domain: String,
}

pub struct UrlExtractor;

impl UrlExtractor {
    /// Returns the URLs in `content` in order of appearance.
    ///
    /// Matches that fail to parse or whose host has no recognised suffix are
    /// skipped. Calling this again restarts the scan.
    #[must_use]
    pub fn candidates(content: &str) -> Candidates<'_> {
        Candidates {
            matches: (content.contains("http")).then(|| URL_RE.find_iter(content)),
        }
    }

    /// Extracts the registrable domain of `host`.
    ///
    /// This is a heuristic limited to `.com` and `.it`, not a public suffix lookup.
    #[must_use]
    pub fn registrable_domain(host: &str) -> Option<&str> {
        REGISTRABLE_DOMAIN_RE
            .captures(host)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    fn parse(matched: &str) -> Option<CandidateUrl> {
        let url = match Url::parse(matched) {
            Ok(url) => url,
            Err(e) => {
                debug!(candidate = matched, error = %e, "Error parsing URL");
                return None;
            }
        };

        let Some(domain) = url.host_str().and_then(Self::registrable_domain) else {
            debug!(candidate = matched, host = ?url.host_str(), "No TLD found");
            return None;
        };
        let domain = domain.to_owned();

        Some(CandidateUrl {
            matched: matched.to_owned(),
            url,
            domain,
        })
    }
}

/// Lazy iterator over the URLs of one message.
pub struct Candidates<'h> {
    matches: Option<Matches<'static, 'h>>,
}

impl Iterator for Candidates<'_> {
    type Item = CandidateUrl;

    fn next(&mut self) -> Option<Self::Item> {
        let matches = self.matches.as_mut()?;
        matches.find_map(|m| UrlExtractor::parse(m.as_str()))
    }
}
