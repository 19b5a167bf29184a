use axum::{Extension, Json, extract::State};
use std::sync::Arc;
use tracing::debug;

use crate::auth::AuthContext;
use crate::error::ProxyError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{PexelRequest, PexelResponse};
use crate::proxy::cached_pexel;
use crate::state::AppState;

pub async fn pexel_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthContext>,
    Json(payload): Json<PexelRequest>,
) -> Result<Json<PexelResponse>, ProxyError> {
    REQUEST_TOTAL.with_label_values(&["pexel"]).inc();
    debug!(brand = %caller.brand_id, user = %caller.user_id, items = ?payload.items, "Photo request");

    let result = cached_pexel(&state, &payload).await?;

    Ok(Json(PexelResponse { result }))
}
