use serde::Deserialize;

/// Reddit listing wrapper (`kind: "Listing"`).
#[derive(Debug, Deserialize)]
pub struct RedditListing {
    #[serde(default)]
    pub kind: String,
    pub data: ListingData,
}

impl RedditListing {
    /// Posts (and comments) contained in the listing.
    pub fn posts(&self) -> impl Iterator<Item = &PostData> {
        self.data.children.iter().map(|child| &child.data)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<RedditThing>,
}

/// One listing child (`t3` post, `t1` comment, `more`).
#[derive(Debug, Deserialize)]
pub struct RedditThing {
    #[serde(default)]
    pub kind: String,
    pub data: PostData,
}

#[derive(Debug, Default, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub media: Option<PostMedia>,
    #[serde(default)]
    pub permalink: String,
    #[serde(default)]
    pub crosspost_parent_list: Vec<PostData>,
}

impl PostData {
    /// Fallback URL of the post's own reddit-hosted video.
    #[must_use]
    pub fn video_fallback_url(&self) -> Option<&str> {
        self.media
            .as_ref()
            .and_then(|media| media.reddit_video.as_ref())
            .map(|video| video.fallback_url.as_str())
            .filter(|url| !url.is_empty())
    }

    /// Whether the post, or the post it crossposts, carries a reddit video.
    #[must_use]
    pub fn has_reddit_video(&self) -> bool {
        self.video_fallback_url().is_some()
            || self
                .crosspost_parent_list
                .iter()
                .any(|parent| parent.video_fallback_url().is_some())
    }

    /// Permalink of the original post, preferring the crosspost parent.
    #[must_use]
    pub fn canonical_permalink(&self) -> Option<&str> {
        self.crosspost_parent_list
            .first()
            .map(|parent| parent.permalink.as_str())
            .filter(|permalink| !permalink.is_empty())
            .or_else(|| Some(self.permalink.as_str()).filter(|p| !p.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
pub struct PostMedia {
    #[serde(default)]
    pub reddit_video: Option<RedditVideo>,
}

#[derive(Debug, Deserialize)]
pub struct RedditVideo {
    #[serde(default)]
    pub fallback_url: String,
}
