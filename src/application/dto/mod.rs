//! Data transfer objects.

mod reddit_dto;

pub use reddit_dto::{ListingData, PostData, PostMedia, RedditListing, RedditThing, RedditVideo};
