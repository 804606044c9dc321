mod basic;
mod client;
pub mod auth;

pub use auth::ApiKey;
pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::{Bytes, BytesMut};

use crate::error::FeedError;

/// Maximum accepted feed payload (50 MiB).
pub const MAX_FEED_SIZE: usize = 50 * 1024 * 1024;

/// Issues one GET for `url` and returns the raw body, capped at
/// [`MAX_FEED_SIZE`].
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FeedError> {
    fetch_bytes_limited(client, url, MAX_FEED_SIZE).await
}

/// Like [`fetch_bytes`] with an explicit size cap.
///
/// An oversized `Content-Length` is rejected before any of the body is read.
/// Otherwise the body is read chunk by chunk and abandoned as soon as it
/// passes `max`.
pub async fn fetch_bytes_limited<C: HttpClient>(
    client: &C,
    url: &str,
    max: usize,
) -> Result<Bytes, FeedError> {
    let url = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let mut resp = client.execute(req).await?;
    if !resp.status().is_success() {
        return Err(FeedError::Status(resp.status()));
    }

    if let Some(len) = resp.content_length() {
        let size = usize::try_from(len).unwrap_or(usize::MAX);
        if size > max {
            return Err(FeedError::TooLarge { size, max });
        }
    }

    let mut buf = BytesMut::new();
    while let Some(chunk) = resp.chunk().await? {
        let size = buf.len() + chunk.len();
        if size > max {
            return Err(FeedError::TooLarge { size, max });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf.freeze())
}
