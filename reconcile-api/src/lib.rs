//! The HTTP surface (§6): an `axum` router exposing the workflow-start
//! and workflow-status endpoints behind HTTP Basic Auth, wrapped in the
//! teacher's own `tower_http` layering style — tracing, CORS, and a
//! panic-recovery boundary — grounded on `barockok-kalla-rust/kalla-server`
//! since the teacher's own `app-server` crate speaks MCP, not REST.

mod dto;
mod error;
mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reconcile_store::{IngestionJobStore, ReconciliationStore, TransactionStore, WorkflowStore};
use reconcile_workflow::WorkflowCoordinator;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use dto::{
    PingResponse, ReconciliationSummaryDto, StartWorkflowRequest, StartWorkflowResponse,
    UnmatchedBankTxDto, UnmatchedSystemTxDto, WorkflowResponse,
};
pub use error::ApiError;
pub use handlers::ApiState;

/// `client_id -> client_secret`, mirroring the original's `GetCredentials()`
/// map built from a list of configured Basic Auth pairs (§6: "a static
/// credentials map").
pub type CredentialsMap = HashMap<String, String>;

/// Builds the full router: routes, Basic Auth, panic recovery, CORS, and
/// per-request tracing spans, mounted under `prefix` (e.g. `"/api"`).
pub fn build_router<S>(
    state: Arc<ApiState<S>>,
    prefix: &str,
    credentials: CredentialsMap,
) -> Router
where
    S: WorkflowStore + IngestionJobStore + TransactionStore + ReconciliationStore + 'static,
{
    let credentials = Arc::new(credentials);
    let authenticated = Router::new()
        .route("/v1/workflow", post(handlers::start_workflow::<S>))
        .route(
            "/v1/workflow/{workflow_id}",
            get(handlers::get_workflow::<S>),
        )
        .with_state(state)
        .layer(middleware::from_fn_with_state(credentials, require_basic_auth));

    Router::new()
        .route("/ping", get(handlers::ping))
        .nest(prefix, authenticated)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Rejects any request whose `Authorization` header is absent, malformed,
/// or does not match a configured `(client_id, client_secret)` pair —
/// 401, never reaching the handler (§8 ambient-stack property).
async fn require_basic_auth(
    State(credentials): State<Arc<CredentialsMap>>,
    request: Request,
    next: Next,
) -> Response {
    if !authorized(request.headers().get(header::AUTHORIZATION), &credentials) {
        return unauthorized();
    }
    next.run(request).await
}

fn authorized(header_value: Option<&axum::http::HeaderValue>, credentials: &CredentialsMap) -> bool {
    let Some((client_id, client_secret)) =
        header_value.and_then(|value| value.to_str().ok()).and_then(decode_basic)
    else {
        return false;
    };
    match credentials.get(&client_id) {
        Some(expected) => constant_time_eq(expected.as_bytes(), client_secret.as_bytes()),
        None => false,
    }
}

/// Compares two byte strings in time independent of where they first
/// differ, so a mismatched `client_secret` can't be recovered by timing
/// how quickly the comparison fails.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (client_id, client_secret) = decoded.split_once(':')?;
    Some((client_id.to_string(), client_secret.to_string()))
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: &'static str,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            success: false,
            error: "unauthorized",
        }),
    )
        .into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            error: "API not found",
        }),
    )
        .into_response()
}

#[derive(Serialize)]
struct PanicBody {
    success: bool,
    error: String,
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic.message = %message, "request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(PanicBody {
            success: false,
            error: message,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::NaiveDate;
    use object_store::memory::InMemory;
    use object_store::path::Path as ObjectPath;
    use object_store::ObjectStore;
    use pretty_assertions::assert_eq;
    use reconcile_store::InMemoryStore;
    use tower::ServiceExt;

    fn credentials() -> CredentialsMap {
        HashMap::from([("admin".to_string(), "secret".to_string())])
    }

    fn auth_header() -> String {
        format!("Basic {}", BASE64.encode("admin:secret"))
    }

    fn test_router() -> Router {
        let store = Arc::new(InMemoryStore::new());
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let coordinator = Arc::new(WorkflowCoordinator::new(store, objects));
        let state = Arc::new(ApiState { coordinator });
        build_router(state, "/api", credentials())
    }

    #[tokio::test]
    async fn ping_requires_no_auth_and_returns_success() {
        let router = test_router();
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/ping")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_credentials_are_rejected_with_401() {
        let router = test_router();
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/workflow")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from("{}"))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_credentials_are_rejected_with_401() {
        let router = test_router();
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/workflow")
                    .header("authorization", "Basic d3Jvbmc6Y3JlZHM=")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from("{}"))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_authorization_header_is_rejected_with_401() {
        let router = test_router();
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/workflow")
                    .header("authorization", "Bearer not-basic-at-all")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from("{}"))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_path_returns_404_with_api_not_found_body() {
        let router = test_router();
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/nonexistent")
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("valid json");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "API not found");
    }

    #[tokio::test]
    async fn start_and_fetch_workflow_round_trips_through_the_router() {
        let store = Arc::new(InMemoryStore::new());
        let objects: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        objects
            .put(
                &ObjectPath::from("system.csv"),
                Bytes::from_static(b"trxID,amount,type,timestamp\n").into(),
            )
            .await
            .expect("put succeeds");
        objects
            .put(
                &ObjectPath::from("bank.csv"),
                Bytes::from_static(b"uniqueID,amount,date,bankCode\n").into(),
            )
            .await
            .expect("put succeeds");

        let coordinator = Arc::new(WorkflowCoordinator::new(Arc::clone(&store), objects));
        let state = Arc::new(ApiState { coordinator });
        let router = build_router(state, "/api", credentials());

        let start: NaiveDate = NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date");
        let request_body = serde_json::json!({
            "system_transaction_file_path": "system.csv",
            "bank_statement_file_paths": ["bank.csv"],
            "start_date": start.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
            "end_date": start.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        });

        let response = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/api/v1/workflow")
                    .header("authorization", auth_header())
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(request_body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("valid json");
        let workflow_id = json["workflow_id"]
            .as_str()
            .expect("workflow_id present")
            .to_string();

        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri(format!("/api/v1/workflow/{workflow_id}"))
                    .header("authorization", auth_header())
                    .body(axum::body::Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
