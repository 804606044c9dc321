use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PublishError;
use crate::fetch::HttpClient;

use super::{CatalogApi, CatalogItemMap, PublishResult};

#[derive(Serialize)]
struct PublishRequest<'a> {
    data: &'a CatalogItemMap,
}

/// Publishes catalog items over HTTP.
///
/// `C` is expected to carry the credential (usually an
/// [`ApiKey`](crate::fetch::ApiKey) around a [`BasicClient`](crate::fetch::BasicClient)).
pub struct CatalogClient<C> {
    client: C,
    domain: String,
    group: String,
}

impl<C: HttpClient> CatalogClient<C> {
    pub fn new(client: C, domain: &str, group: &str) -> Self {
        Self {
            client,
            domain: domain.to_string(),
            group: group.to_string(),
        }
    }

    /// `https://{domain}/catalog/items/{group}`, with `group` encoded as a
    /// single path segment.
    pub fn endpoint(&self) -> Result<reqwest::Url, PublishError> {
        let base = format!("https://{}/", self.domain);
        let invalid = |reason: String| PublishError::InvalidUrl {
            url: base.clone(),
            reason,
        };

        let mut url = reqwest::Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .clear()
            .extend(["catalog", "items", self.group.as_str()]);
        Ok(url)
    }

    fn build_request(&self, items: &CatalogItemMap) -> Result<reqwest::Request, PublishError> {
        let url = self.endpoint()?;
        let body = serde_json::to_vec(&PublishRequest { data: items })?;

        let mut req = reqwest::Request::new(reqwest::Method::POST, url);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());
        Ok(req)
    }
}

#[async_trait]
impl<C: HttpClient> CatalogApi for CatalogClient<C> {
    #[tracing::instrument(skip_all, fields(items = items.len()))]
    async fn publish(&self, items: &CatalogItemMap) -> Result<PublishResult, PublishError> {
        let req = self.build_request(items)?;

        let response = self.client.execute(req).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::RemoteRejection {
                status,
                message: rejection_message(&body),
            });
        }

        let body = response.text().await?;

        debug!(%status, group = %self.group, "Catalog accepted update");
        info!(items_updated = items.len(), "Catalog updated");

        Ok(PublishResult {
            success: true,
            items_updated: items.len(),
            timestamp: Utc::now(),
            remote_response: parse_body(&body),
        })
    }
}

/// JSON bodies are kept as-is, anything else as a string; empty is null.
fn parse_body(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}

/// Pulls a human-readable reason out of an error body.
fn rejection_message(body: &str) -> String {
    let json = parse_body(body);
    ["message", "error"]
        .iter()
        .find_map(|key| json.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
