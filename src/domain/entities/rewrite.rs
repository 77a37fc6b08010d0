//! Link classification and rewrite outcomes.

use url::Url;

/// Whether a Reddit submission carries a native video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoVerdict {
    /// Not resolved yet; forces a live lookup.
    #[default]
    Unknown,
    IsVideo,
    NotVideo,
}

impl VideoVerdict {
    #[must_use]
    pub const fn from_cached(is_video: bool) -> Self {
        if is_video { Self::IsVideo } else { Self::NotVideo }
    }

    #[must_use]
    pub const fn is_video(self) -> bool {
        matches!(self, Self::IsVideo)
    }
}

/// Outcome of resolving a `v.redd.it` short link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectResolution {
    /// Canonical post the short link points at.
    Resolved(Url),
    /// Lookup succeeded but yielded nothing usable.
    Empty,
}

impl RedirectResolution {
    /// Value stored in the result cache for this outcome.
    #[must_use]
    pub fn cache_value(&self) -> String {
        match self {
            Self::Resolved(url) => url.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// A value stored in the result cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// Reddit video verdict for a post URL.
    Verdict(bool),
    /// Short-link resolution; empty means a previous lookup found nothing.
    Redirect(String),
}

/// Rewritten links for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteResult {
    links: Vec<String>,
    suppress_native_embed: bool,
    includes_reddit_video: bool,
}

impl RewriteResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rewritten link unless it is already present.
    pub fn push(&mut self, link: impl Into<String>) {
        let link = link.into();
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    pub const fn request_suppression(&mut self) {
        self.suppress_native_embed = true;
    }

    /// Marks that a Reddit video was rewritten. Implies suppression.
    pub const fn mark_reddit_video(&mut self) {
        self.includes_reddit_video = true;
        self.suppress_native_embed = true;
    }

    #[must_use]
    pub fn links(&self) -> &[String] {
        &self.links
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    #[must_use]
    pub const fn should_suppress_native_embed(&self) -> bool {
        self.suppress_native_embed
    }

    #[must_use]
    pub const fn includes_reddit_video(&self) -> bool {
        self.includes_reddit_video
    }

    /// Renders the reply text: one link per line, followed by `note` when a
    /// Reddit video was rewritten.
    #[must_use]
    pub fn render_reply(&self, note: &str) -> String {
        let mut reply = String::new();
        for link in &self.links {
            reply.push_str(link);
            reply.push('\n');
        }
        if self.includes_reddit_video && !note.is_empty() {
            reply.push_str(note);
            reply.push('\n');
        }
        reply
    }
}
