//! URL builders for the feed API

use url::Url;
use uuid::Uuid;

use super::FeedRecord;

/// Number of records requested per feed page
const FEED_PAGE_SIZE: u32 = 10;

/// The paginated feed listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEndpoint {
    /// First page, or the page following `after`
    Get { after: Option<Uuid> },
}

impl FeedEndpoint {
    /// Endpoint for the page after `after`, or the first page
    pub fn get(after: Option<&FeedRecord>) -> Self {
        FeedEndpoint::Get {
            after: after.map(|record| record.id),
        }
    }

    /// Resolve against the API base URL
    ///
    /// Produces `{base}/v1/feed?limit=10`, plus `&after_id={id}` when paging.
    pub fn url(&self, base_url: &Url) -> Url {
        match self {
            FeedEndpoint::Get { after } => {
                let mut url = join_path(base_url, &["v1", "feed"]);
                {
                    let mut query = url.query_pairs_mut();
                    query.append_pair("limit", &FEED_PAGE_SIZE.to_string());
                    if let Some(id) = after {
                        query.append_pair("after_id", &id.to_string());
                    }
                }
                url
            }
        }
    }

    /// The `after_id` of a feed page URL, if it asks for a later page
    pub fn cursor(url: &Url) -> Option<Uuid> {
        url.query_pairs()
            .find(|(key, _)| key == "after_id")
            .and_then(|(_, value)| Uuid::parse_str(&value).ok())
    }
}

/// Comments for a single image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCommentsEndpoint {
    Get(Uuid),
}

impl ImageCommentsEndpoint {
    pub fn get(image_id: Uuid) -> Self {
        ImageCommentsEndpoint::Get(image_id)
    }

    /// Produces `{base}/v1/image/{id}/comments`
    pub fn url(&self, base_url: &Url) -> Url {
        match self {
            ImageCommentsEndpoint::Get(id) => {
                join_path(base_url, &["v1", "image", &id.to_string(), "comments"])
            }
        }
    }
}

/// Appends path segments to `base`, keeping any path the base already has
fn join_path(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
