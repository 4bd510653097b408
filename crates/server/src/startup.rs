use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use service::{notify::HttpNotifier, store, Inventory};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::errors::StartupError;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

/// Open the configured backend and wire it to the HTTP notifier.
pub async fn build_inventory(cfg: &AppConfig) -> Result<Arc<Inventory>, StartupError> {
    let path = cfg.storage.path();
    if cfg.storage.kind.is_persistent() {
        common::env::ensure_store_dir(&path).await?;
    }
    let store = store::open(cfg.storage.kind, &path).await?;
    let notifier = HttpNotifier::new(cfg.notify.url.clone(), cfg.notify.timeout())
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let notify_url = notifier.url().to_string();
    let inventory = Inventory::new(store, Arc::new(notifier), cfg.notify.threshold);
    info!(kind = %cfg.storage.kind, %notify_url, threshold = inventory.threshold(), "inventory ready");
    Ok(Arc::new(inventory))
}

pub fn build_app(inventory: Arc<Inventory>) -> Router {
    routes::build_router(inventory, build_cors())
}

/// Serve on `listener` until `shutdown` resolves, then close the store once.
pub async fn serve<F>(listener: TcpListener, inventory: Arc<Inventory>, shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_app(inventory.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StartupError::Any(e.into()))?;
    info!("http server stopped; closing store");
    inventory.close().await.map_err(|e| {
        error!(error = %e, "error closing store");
        StartupError::Close(e.to_string())
    })
}

/// Public entry: load configuration, open the store and run the HTTP server.
pub async fn run<F>(shutdown: F) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    dotenv().ok();
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let inventory = build_inventory(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    let listener = TcpListener::bind(addr).await.map_err(|e| StartupError::Any(e.into()))?;
    info!(%addr, storage = %cfg.storage.kind, "starting asset inventory server");
    serve(listener, inventory, shutdown).await
}
