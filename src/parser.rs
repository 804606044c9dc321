//! Protobuf decoder for GTFS Realtime feeds.
//!
//! [`parse_feed`] turns raw bytes into a [`FeedMessage`]; [`trip_updates`]
//! flattens that message into the plain records the selector consumes.

use prost::Message;

use crate::error::FeedError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::gtfs_rt::FeedMessage;

/// One trip's worth of stop predictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripUpdateRecord {
    pub route_id: Option<String>,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

/// Latest arrival time accepted from a feed (year 3000, epoch seconds).
pub const MAX_ARRIVAL_EPOCH: i64 = 32_503_680_000;

/// A single predicted stop. `arrival_time` is epoch seconds, always within
/// `0..=MAX_ARRIVAL_EPOCH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeUpdate {
    pub stop_id: Option<String>,
    pub arrival_time: Option<i64>,
}

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the bytes are not valid protobuf for a
/// `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    Ok(FeedMessage::decode(bytes)?)
}

/// Fetches `url` through `client` and decodes the body.
#[tracing::instrument(skip(client))]
pub async fn fetch_feed<C: HttpClient>(client: &C, url: &str) -> Result<FeedMessage, FeedError> {
    let bytes = fetch_bytes(client, url).await?;
    tracing::debug!(bytes = bytes.len(), "Feed bytes received, parsing");
    let feed = parse_feed(&bytes)?;
    tracing::debug!(entity_count = feed.entity.len(), "Feed parsed successfully");
    Ok(feed)
}

/// Extracts the trip updates carried by `feed`.
///
/// Entities without a trip update are dropped. Arrival times are normalised
/// to a plain `i64` here and nowhere else; values outside
/// `0..=MAX_ARRIVAL_EPOCH` are treated as absent.
pub fn trip_updates(feed: &FeedMessage) -> Vec<TripUpdateRecord> {
    feed.entity
        .iter()
        .filter_map(|e| e.trip_update.as_ref())
        .map(|tu| TripUpdateRecord {
            route_id: tu.trip.route_id.clone(),
            stop_time_updates: tu
                .stop_time_update
                .iter()
                .map(|stu| StopTimeUpdate {
                    stop_id: stu.stop_id.clone(),
                    arrival_time: stu
                        .arrival
                        .as_ref()
                        .and_then(|a| a.time)
                        .filter(|t| (0..=MAX_ARRIVAL_EPOCH).contains(t)),
                })
                .collect(),
        })
        .collect()
}
