//! Catalog items: formatting arrivals into fixed slots and publishing them.
//!
//! [`format_items`] turns selector output into a [`CatalogItemMap`];
//! [`CatalogApi`] is the async seam for pushing that map to the remote
//! catalog, implemented over HTTP by [`CatalogClient`].

mod client;
mod format;

pub use client::CatalogClient;
pub use format::{PLACEHOLDER, example_items, format_items, item_id};

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::PublishError;

/// The value a display reads for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub minutes_away: String,
}

/// Item id (`<prefix>_<slot>`) to item, ordered by id.
pub type CatalogItemMap = BTreeMap<String, CatalogItem>;

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    pub success: bool,
    pub items_updated: usize,
    pub timestamp: DateTime<Utc>,
    /// Whatever the catalog answered with; not interpreted.
    pub remote_response: serde_json::Value,
}

/// Abstraction over the remote catalog.
#[async_trait::async_trait]
pub trait CatalogApi: Send + Sync {
    /// Replaces the group's items with `items` in a single request.
    async fn publish(&self, items: &CatalogItemMap) -> Result<PublishResult, PublishError>;
}
