//! Development receiver for over-assignment notifications.
//!
//! Accepts `POST /api/notify` with `{level, employeeAbbreviation, message}`,
//! logs the alert and answers `201 Created`.

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::post, Json, Router};
use dotenvy::dotenv;
use serde::Deserialize;
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
struct Notification {
    level: String,
    #[serde(rename = "employeeAbbreviation")]
    employee: String,
    message: String,
}

async fn notify(Json(n): Json<Notification>) -> (StatusCode, Json<serde_json::Value>) {
    let level = n.level.to_ascii_uppercase();
    match level.as_str() {
        "INFO" => info!("{level} [{}]: {}", n.employee, n.message),
        "WARNING" => warn!("{level} [{}]: {}", n.employee, n.message),
        "ERROR" => error!("{level} [{}]: {}", n.employee, n.message),
        _ => {
            warn!(level = %n.level, "rejected notification with unknown level");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "'level' must be one of Info, Warning, Error"})),
            );
        }
    }
    (StatusCode::CREATED, Json(serde_json::json!({})))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    common::utils::logging::init_logging_default();

    let addr: SocketAddr = std::env::var("LISTENER_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;
    let app = Router::new().route("/api/notify", post(notify));

    info!(%addr, "notification listener ready");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
