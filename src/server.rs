//! HTTP surface: a documentation page, a manual publish trigger and a
//! health probe.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::{error, info};

use crate::catalog::{CatalogApi, PublishResult, example_items};
use crate::config::Board;
use crate::scheduler::{SchedulerMonitor, SchedulerStats};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub board: Board,
    pub monitor: SchedulerMonitor,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub message: String,
    pub result: PublishResult,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub cycle_in_progress: bool,
    pub scheduler: SchedulerStats,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(docs))
        .route("/trigger", get(trigger).post(trigger))
        .route("/health", get(health))
        .with_state(state)
}

async fn docs(State(state): State<AppState>) -> Html<String> {
    let [a, b] = &state.board.directions;
    Html(format!(
        r#"<!doctype html>
<html>
<head><title>Arrival board</title></head>
<body>
<h1>Arrival board</h1>
<p>Publishes the next three <strong>{route}</strong> trains for
{a_name} (stop {a_stop}) and {b_name} (stop {b_stop}) to the catalog,
refreshing on a fixed interval.</p>
<p>Catalog items: <code>{a_prefix}_1..3</code> and <code>{b_prefix}_1..3</code>,
each <code>{{"minutesAway": "..."}}</code>. Empty slots read <code>--</code>.</p>
<h2>Endpoints</h2>
<ul>
<li><code>GET /trigger</code> publishes a fixed example set of items and reports the catalog's answer.</li>
<li><code>GET /health</code> returns scheduler counters.</li>
</ul>
</body>
</html>
"#,
        route = state.board.route_id,
        a_name = a.name,
        a_stop = a.stop_id,
        a_prefix = a.prefix,
        b_name = b.name,
        b_stop = b.stop_id,
        b_prefix = b.prefix,
    ))
}

async fn trigger(State(state): State<AppState>) -> Response {
    let items = example_items(&state.board);
    info!(items = items.len(), "Manual trigger: publishing example items");

    match state.catalog.publish(&items).await {
        Ok(result) => Json(TriggerResponse {
            message: format!(
                "Published {} example items; live data replaces them on the next cycle",
                result.items_updated
            ),
            result,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Manual trigger failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "Failed to publish example items".to_string(),
                    details: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        cycle_in_progress: state.monitor.cycle_in_progress(),
        scheduler: state.monitor.stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogItemMap;
    use crate::error::{CycleError, PublishError};
    use crate::scheduler::{Cycle, UpdateScheduler};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    struct StubCatalog {
        reject: bool,
    }

    #[async_trait::async_trait]
    impl CatalogApi for StubCatalog {
        async fn publish(&self, items: &CatalogItemMap) -> Result<PublishResult, PublishError> {
            if self.reject {
                return Err(PublishError::RemoteRejection {
                    status: reqwest::StatusCode::FORBIDDEN,
                    message: "group is read-only".into(),
                });
            }
            Ok(PublishResult {
                success: true,
                items_updated: items.len(),
                timestamp: chrono::Utc::now(),
                remote_response: serde_json::json!({ "status": "ok" }),
            })
        }
    }

    struct Idle;

    #[async_trait::async_trait]
    impl Cycle for Idle {
        async fn run(&self) -> Result<PublishResult, CycleError> {
            unreachable!("not driven in these tests")
        }
    }

    fn app(reject: bool) -> Router {
        let scheduler = UpdateScheduler::new(Idle, std::time::Duration::from_secs(3600));
        router(AppState {
            catalog: Arc::new(StubCatalog { reject }),
            board: Board::greenpoint_av(),
            monitor: scheduler.monitor(),
        })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_trigger_reports_publish_result() {
        let (status, body) = get_json(app(false), "/trigger").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["success"], true);
        assert_eq!(body["result"]["itemsUpdated"], 6);
        assert_eq!(body["result"]["remoteResponse"]["status"], "ok");
        assert!(body["message"].as_str().unwrap().contains("6 example items"));
    }

    #[tokio::test]
    async fn test_trigger_surfaces_failure() {
        let (status, body) = get_json(app(true), "/trigger").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["details"].as_str().unwrap().contains("group is read-only"));
    }

    #[tokio::test]
    async fn test_health_reports_idle_scheduler() {
        let (status, body) = get_json(app(false), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["cycleInProgress"], false);
        assert!(body.get("cycle_in_progress").is_none());
        assert_eq!(body["scheduler"]["started"], 0);
    }

    #[tokio::test]
    async fn test_docs_page_lists_items() {
        let response = app(false)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(html.contains("queens_1..3"));
        assert!(html.contains("G26S"));
    }
}
