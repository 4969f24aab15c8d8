//! Response mappers for the feed API
//!
//! A mapper turns HTTP status metadata plus a raw body into a resource, or
//! rejects the response. Remote loaders take one of these at construction.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use super::{FeedRecord, ImageComment};
use crate::http::HttpResponse;

/// Status code the feed and image endpoints answer with on success
const OK_200: u16 = 200;

/// Reasons a response is rejected by a mapper
#[derive(Debug, Error)]
pub enum MapperError {
    /// The status code is not one the endpoint answers with on success
    #[error("Unexpected HTTP status: {0}")]
    UnexpectedStatus(u16),

    /// The body did not decode into the expected shape
    #[error("Failed to parse response body")]
    ParseError(#[from] serde_json::Error),

    /// The body was empty where data is required
    #[error("Response body is empty")]
    EmptyBody,

    /// A timestamp in the body is not ISO 8601
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),
}

/// Feed listing as served by the API
#[derive(Debug, Deserialize)]
struct FeedResponse {
    items: Vec<RemoteFeedItem>,
}

/// A single feed entry as served by the API
#[derive(Debug, Deserialize)]
struct RemoteFeedItem {
    id: Uuid,
    description: Option<String>,
    location: Option<String>,
    image: Url,
}

/// Comment listing as served by the API
#[derive(Debug, Deserialize)]
struct CommentsResponse {
    items: Vec<RemoteComment>,
}

#[derive(Debug, Deserialize)]
struct RemoteComment {
    id: Uuid,
    message: String,
    created_at: String,
    author: RemoteAuthor,
}

#[derive(Debug, Deserialize)]
struct RemoteAuthor {
    username: String,
}

/// Maps a feed listing response
///
/// Only status 200 is accepted.
pub fn map_feed_items(
    response: &HttpResponse,
    body: &[u8],
) -> Result<Vec<FeedRecord>, MapperError> {
    if response.status != OK_200 {
        return Err(MapperError::UnexpectedStatus(response.status));
    }

    let decoded: FeedResponse = serde_json::from_slice(body)?;
    Ok(decoded
        .items
        .into_iter()
        .map(|item| FeedRecord::new(item.id, item.description, item.location, item.image))
        .collect())
}

/// Maps an image data response
///
/// Only status 200 with a non-empty body is accepted.
pub fn map_image_data(response: &HttpResponse, body: &[u8]) -> Result<Vec<u8>, MapperError> {
    if response.status != OK_200 {
        return Err(MapperError::UnexpectedStatus(response.status));
    }
    if body.is_empty() {
        return Err(MapperError::EmptyBody);
    }
    Ok(body.to_vec())
}

/// Maps an image comments response
///
/// Any 2xx status is accepted.
pub fn map_image_comments(
    response: &HttpResponse,
    body: &[u8],
) -> Result<Vec<ImageComment>, MapperError> {
    if !response.is_success() {
        return Err(MapperError::UnexpectedStatus(response.status));
    }

    let decoded: CommentsResponse = serde_json::from_slice(body)?;
    decoded
        .items
        .into_iter()
        .map(|comment| {
            Ok(ImageComment {
                id: comment.id,
                message: comment.message,
                created_at: parse_timestamp(&comment.created_at)?,
                username: comment.author.username,
            })
        })
        .collect()
}

/// Parse an ISO 8601 timestamp, with or without a colon in the offset
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MapperError> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| MapperError::InvalidTimeFormat(value.to_string()))
}
