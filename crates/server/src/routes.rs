use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use models::Asset;
use serde::Deserialize;
use service::{store::KeyKind, Inventory};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::errors::ApiError;
use crate::metrics::metrics_handler;

pub type AppState = Arc<Inventory>;
type Params = Query<HashMap<String, String>>;

/// Body of the assign endpoints.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub assignee: String,
}

pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

/// Query parameter carrying the value for an identifying kind.
fn param_name(kind: KeyKind) -> &'static str {
    match kind {
        KeyKind::Mac => "mac",
        KeyKind::Name => "name",
        KeyKind::Ip => "ip",
        _ => "assignee",
    }
}

fn required<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ApiError> {
    params
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing query parameter '{name}'")))
}

async fn read_one(State(inv): State<AppState>, Query(params): Params, kind: KeyKind) -> Result<Json<Asset>, ApiError> {
    let key = required(&params, param_name(kind))?;
    Ok(Json(inv.read(kind, key).await?))
}

async fn read_by_assignee(State(inv): State<AppState>, Query(params): Params) -> Result<Json<Vec<Asset>>, ApiError> {
    let assignee = required(&params, "assignee")?;
    Ok(Json(inv.read_all(KeyKind::Assignee, assignee).await?))
}

async fn read_all(State(inv): State<AppState>) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(inv.read_all(KeyKind::All, "").await?))
}

async fn read_unassigned(State(inv): State<AppState>) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(inv.read_all(KeyKind::Unassigned, "").await?))
}

async fn add_computer(
    State(inv): State<AppState>,
    payload: Result<Json<Asset>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(asset) = payload.map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;
    inv.add(asset).await?;
    Ok(StatusCode::CREATED)
}

async fn assign(
    State(inv): State<AppState>,
    payload: Result<Json<AssignRequest>, JsonRejection>,
    kind: KeyKind,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;
    if req.key.is_empty() {
        return Err(ApiError::bad_request("missing mandatory property 'key'"));
    }
    if req.assignee.is_empty() {
        return Err(ApiError::bad_request("missing mandatory property 'assignee'"));
    }
    inv.assign(kind, &req.key, &req.assignee).await?;
    Ok(StatusCode::OK)
}

async fn unassign(State(inv): State<AppState>, Query(params): Params, kind: KeyKind) -> Result<StatusCode, ApiError> {
    let key = required(&params, param_name(kind))?;
    inv.unassign(kind, key).await?;
    Ok(StatusCode::OK)
}

async fn remove(State(inv): State<AppState>, Query(params): Params, kind: KeyKind) -> Result<StatusCode, ApiError> {
    let key = required(&params, param_name(kind))?;
    inv.delete(kind, key).await?;
    Ok(StatusCode::OK)
}

/// Build the application router over a shared inventory.
pub fn build_router(inventory: AppState, cors: CorsLayer) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .route("/getComputersByAssignee", get(read_by_assignee))
        .route("/getComputers", get(read_all))
        .route("/getUnassignedComputers", get(read_unassigned))
        .route("/addComputer", post(add_computer));

    // MAC, Name and IP each get the same four endpoints
    for kind in [KeyKind::Mac, KeyKind::Name, KeyKind::Ip] {
        app = app
            .route(
                &format!("/getComputerBy{kind}"),
                get(move |s: State<AppState>, q: Params| read_one(s, q, kind)),
            )
            .route(
                &format!("/assignComputerBy{kind}"),
                put(move |s: State<AppState>, body: Result<Json<AssignRequest>, JsonRejection>| {
                    assign(s, body, kind)
                }),
            )
            .route(
                &format!("/unassignComputerBy{kind}"),
                delete(move |s: State<AppState>, q: Params| unassign(s, q, kind)),
            )
            .route(
                &format!("/deleteComputerBy{kind}"),
                delete(move |s: State<AppState>, q: Params| remove(s, q, kind)),
            );
    }

    app.with_state(inventory)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx responses
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use service::{
        errors::NotifyError,
        notify::{Notification, Notifier},
        store::volatile::VolatileStore,
    };
    use tower::ServiceExt;

    struct Unreachable;

    #[async_trait]
    impl Notifier for Unreachable {
        async fn send(&self, _: &Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Network("connection refused".into()))
        }
    }

    fn app() -> Router {
        let inv = Inventory::new(Box::new(VolatileStore::new()), Arc::new(Unreachable), 3);
        build_router(Arc::new(inv), CorsLayer::very_permissive())
    }

    fn json_req(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn add_read_and_delete_by_each_key() {
        let app = app();
        let asset = serde_json::json!({"mac": "01:23:45:67:89:ab", "name": "C1", "ip": "172.1.0.1"});
        let (status, _) = send(&app, json_req("POST", "/addComputer", asset.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        for uri in ["/getComputerByMAC?mac=01:23:45:67:89:ab", "/getComputerByName?name=C1", "/getComputerByIP?ip=172.1.0.1"] {
            let (status, body) = send(&app, get_req(uri)).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(body["name"], "C1");
            assert_eq!(body["assignee"], "");
        }

        let (status, _) = send(&app, json_req("POST", "/addComputer", asset)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let req = Request::builder().method("DELETE").uri("/deleteComputerByName?name=C1").body(Body::empty()).unwrap();
        assert_eq!(send(&app, req).await.0, StatusCode::OK);
        let (status, body) = send(&app, get_req("/getComputers")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn bad_input_is_rejected_with_400() {
        let app = app();
        let (status, _) = send(&app, json_req("POST", "/addComputer", serde_json::json!({"mac": "m", "name": "n"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .method("POST")
            .uri("/addComputer")
            .header("content-type", "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        assert_eq!(send(&app, req).await.0, StatusCode::BAD_REQUEST);

        assert_eq!(send(&app, get_req("/getComputerByMAC")).await.0, StatusCode::BAD_REQUEST);

        let bad = serde_json::json!({"key": "m", "assignee": "ABCD"});
        assert_eq!(send(&app, json_req("PUT", "/assignComputerByMAC", bad)).await.0, StatusCode::BAD_REQUEST);
        let missing = serde_json::json!({"key": "m"});
        assert_eq!(send(&app, json_req("PUT", "/assignComputerByMAC", missing)).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn failed_notification_is_500_but_assignment_sticks() {
        let app = app();
        for n in 1..=4 {
            let asset = serde_json::json!({"mac": format!("m{n}"), "name": format!("n{n}"), "ip": format!("i{n}")});
            assert_eq!(send(&app, json_req("POST", "/addComputer", asset)).await.0, StatusCode::CREATED);
        }
        for n in 1..=3 {
            let body = serde_json::json!({"key": format!("i{n}"), "assignee": "ABC"});
            assert_eq!(send(&app, json_req("PUT", "/assignComputerByIP", body)).await.0, StatusCode::OK);
        }
        let body = serde_json::json!({"key": "i4", "assignee": "ABC"});
        let (status, err) = send(&app, json_req("PUT", "/assignComputerByIP", body)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err["error"].as_str().unwrap().contains("over-assignment"));

        let (status, owned) = send(&app, get_req("/getComputersByAssignee?assignee=ABC")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(owned.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn health_and_metrics() {
        let app = app();
        let (status, body) = send(&app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "ok"}));

        // make sure at least one counter has been touched
        let _ = send(&app, get_req("/getComputers")).await;
        let resp = app.clone().oneshot(get_req("/metrics")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("assetdb_store_operations_total"));
    }
}
