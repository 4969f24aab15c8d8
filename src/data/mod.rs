//! Core data models for the feed
//!
//! This module contains the resource types produced by loaders and kept in
//! the local cache, plus the URL builders and response mappers for the
//! remote API.

pub mod endpoint;
pub mod mappers;

pub use endpoint::{FeedEndpoint, ImageCommentsEndpoint};
pub use mappers::{map_feed_items, map_image_comments, map_image_data, MapperError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// A single image post in the feed
///
/// Identity is `id`; everything else is plain value data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRecord {
    /// Unique identifier of the post
    pub id: Uuid,
    /// Optional caption
    pub description: Option<String>,
    /// Optional place name
    pub location: Option<String>,
    /// Where the image bytes live
    pub image_url: Url,
}

impl FeedRecord {
    pub fn new(
        id: Uuid,
        description: Option<String>,
        location: Option<String>,
        image_url: Url,
    ) -> Self {
        Self {
            id,
            description,
            location,
            image_url,
        }
    }
}

/// The one persisted copy of the feed, with the time it was cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    /// Records in feed order
    pub items: Vec<FeedRecord>,
    /// When the snapshot was written
    pub timestamp: DateTime<Utc>,
}

impl FeedSnapshot {
    pub fn new(items: Vec<FeedRecord>, timestamp: DateTime<Utc>) -> Self {
        Self { items, timestamp }
    }
}

/// A comment left on an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageComment {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Display name of the author
    pub username: String,
}
