use axum::{Extension, Json, extract::State};
use std::sync::Arc;
use tracing::debug;

use crate::auth::AuthContext;
use crate::error::ProxyError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{GeminiRequest, GeminiResponse};
use crate::proxy::cached_gemini;
use crate::state::AppState;

pub async fn gemini_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthContext>,
    Json(payload): Json<GeminiRequest>,
) -> Result<Json<GeminiResponse>, ProxyError> {
    REQUEST_TOTAL.with_label_values(&["gemini"]).inc();
    debug!(brand = %caller.brand_id, user = %caller.user_id, kind = payload.kind(), "Text request");

    let result = cached_gemini(&state, &payload).await?;

    Ok(Json(GeminiResponse { result }))
}
