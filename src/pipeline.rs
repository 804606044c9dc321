//! One update cycle: fetch, decode, select, format, publish.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::catalog::{CatalogApi, PublishResult, format_items};
use crate::config::Board;
use crate::error::CycleError;
use crate::fetch::HttpClient;
use crate::parser::{fetch_feed, trip_updates};
use crate::scheduler::Cycle;
use crate::selector::{DirectionalArrivals, select_arrivals};

pub struct UpdatePipeline<F, P> {
    feed_client: F,
    feed_url: String,
    board: Board,
    catalog: P,
}

impl<F: HttpClient, P: CatalogApi> UpdatePipeline<F, P> {
    pub fn new(feed_client: F, feed_url: &str, board: Board, catalog: P) -> Self {
        Self {
            feed_client,
            feed_url: feed_url.to_string(),
            board,
            catalog,
        }
    }

    /// Fetches the feed and selects arrivals without publishing anything.
    pub async fn arrivals(&self) -> Result<[DirectionalArrivals; 2], CycleError> {
        let feed = fetch_feed(&self.feed_client, &self.feed_url).await?;
        let trips = trip_updates(&feed);
        // Sampled once so every comparison in this pass agrees on "now".
        let now = Utc::now().timestamp();
        let arrivals = select_arrivals(&trips, &self.board, now);
        debug!(
            trips = trips.len(),
            first = arrivals[0].next_three_trains.len(),
            second = arrivals[1].next_three_trains.len(),
            "Arrivals selected"
        );
        Ok(arrivals)
    }

    /// Runs the full cycle and returns the catalog's answer.
    pub async fn run_once(&self) -> Result<PublishResult, CycleError> {
        let arrivals = self.arrivals().await?;
        let items = format_items(&self.board, &arrivals);
        let result = self.catalog.publish(&items).await?;
        info!(items_updated = result.items_updated, "Cycle published");
        Ok(result)
    }
}

#[async_trait]
impl<F, P> Cycle for UpdatePipeline<F, P>
where
    F: HttpClient + 'static,
    P: CatalogApi + 'static,
{
    async fn run(&self) -> Result<PublishResult, CycleError> {
        self.run_once().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItemMap;
    use crate::error::{FeedError, PublishError};
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, FeedMessage, TripDescriptor, TripUpdate};
    use prost::Message;
    use std::sync::Mutex;

    struct FeedServer {
        status: u16,
        body: Vec<u8>,
    }

    #[async_trait]
    impl HttpClient for FeedServer {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let resp = axum::http::Response::builder()
                .status(self.status)
                .body(self.body.clone())
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    #[derive(Default)]
    struct RecordingCatalog {
        published: Mutex<Vec<CatalogItemMap>>,
    }

    #[async_trait]
    impl CatalogApi for RecordingCatalog {
        async fn publish(&self, items: &CatalogItemMap) -> Result<PublishResult, PublishError> {
            self.published.lock().unwrap().push(items.clone());
            Ok(PublishResult {
                success: true,
                items_updated: items.len(),
                timestamp: Utc::now(),
                remote_response: serde_json::Value::Null,
            })
        }
    }

    fn feed_bytes(arrivals: &[(&str, i64)]) -> Vec<u8> {
        let trip = TripUpdate {
            trip: TripDescriptor {
                route_id: Some("G".into()),
                ..Default::default()
            },
            stop_time_update: arrivals
                .iter()
                .map(|(stop, time)| StopTimeUpdate {
                    stop_id: Some(stop.to_string()),
                    arrival: Some(StopTimeEvent {
                        time: Some(*time),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".into(),
                ..Default::default()
            },
            entity: vec![FeedEntity {
                id: "1".into(),
                trip_update: Some(trip),
                ..Default::default()
            }],
        }
        .encode_to_vec()
    }

    #[tokio::test]
    async fn test_cycle_publishes_six_items() {
        let now = Utc::now().timestamp();
        let pipeline = UpdatePipeline::new(
            FeedServer {
                status: 200,
                body: feed_bytes(&[("G26S", now + 600), ("G26S", now + 1800)]),
            },
            "https://feed.example/g",
            Board::greenpoint_av(),
            RecordingCatalog::default(),
        );

        let result = pipeline.run_once().await.unwrap();

        assert_eq!(result.items_updated, 6);
        let published = pipeline.catalog.published.lock().unwrap();
        let items = &published[0];
        assert_eq!(items["brooklyn_1"].minutes_away, "10 min");
        assert_eq!(items["brooklyn_2"].minutes_away, "30 min");
        assert_eq!(items["brooklyn_3"].minutes_away, "--");
        assert_eq!(items["queens_1"].minutes_away, "--");
    }

    #[tokio::test]
    async fn test_malformed_feed_aborts_before_publish() {
        let pipeline = UpdatePipeline::new(
            FeedServer {
                status: 200,
                body: vec![0xFF, 0xFE, 0x00, 0x01],
            },
            "https://feed.example/g",
            Board::greenpoint_av(),
            RecordingCatalog::default(),
        );

        let err = pipeline.run_once().await.unwrap_err();

        assert!(matches!(err, CycleError::Feed(FeedError::Decode(_))));
        assert!(pipeline.catalog.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_feed_outage_aborts_before_publish() {
        let pipeline = UpdatePipeline::new(
            FeedServer {
                status: 502,
                body: vec![],
            },
            "https://feed.example/g",
            Board::greenpoint_av(),
            RecordingCatalog::default(),
        );

        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, CycleError::Feed(FeedError::Status(_))));
        assert!(pipeline.catalog.published.lock().unwrap().is_empty());
    }
}
