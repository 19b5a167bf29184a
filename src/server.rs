use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::auth::{AuthLayer, JwksCache, JwtAuth};
use crate::cache::{TtlCache, cache_sweeper};
use crate::config::Config;
use crate::handlers::{gemini_handler, health_handler, metrics_handler, pexel_handler};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build vendor client: {0}")]
    Vendor(#[from] crate::vendors::VendorError),

    #[error("failed to build signing key client: {0}")]
    Jwks(#[source] reqwest::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

// Proxy routes sit behind the token check, health and metrics do not
pub fn router(state: Arc<AppState>, auth: AuthLayer) -> Router {
    let proxy = Router::new()
        .route("/gemini", post(gemini_handler))
        .route("/pexel", post(pexel_handler))
        .layer(auth)
        .with_state(state);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(proxy)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn run(config: Config) -> Result<(), ServerError> {
    let mut cache = TtlCache::new(config.cache_ttl);
    if let Some(max) = config.cache_max_entries {
        cache = cache.with_max_entries(max);
    }
    let cache = Arc::new(cache);

    let state = Arc::new(AppState::from_config(&config, cache.clone())?);

    let keys = JwksCache::remote(&config.jwks_url, config.jwks_refresh, config.vendor_timeout)
        .map_err(ServerError::Jwks)?;
    let auth = AuthLayer::new(JwtAuth::new(&config.app_id, keys));

    tokio::spawn(cache_sweeper(cache, config.sweep_interval));

    let app = router(state.clone(), auth);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(port = config.port, app_id = %config.app_id, "Proxy listening");
    info!(ttl = ?config.cache_ttl, max_entries = ?config.cache_max_entries, "Response cache ready");
    info!(
        text = state.text.is_some(),
        photos = state.photos.is_some(),
        "Vendor clients configured"
    );

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
