use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorResponse;
use crate::vendors::VendorError;

pub const GENERIC_FAILURE: &str = "Failed to process the request.";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{vendor} call failed: {source}")]
    Vendor {
        vendor: &'static str,
        #[source]
        source: VendorError,
    },
}

// Vendor detail stays in the logs, callers only see the generic message
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: GENERIC_FAILURE.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vendor_detail_is_not_exposed() {
        let error = ProxyError::Vendor {
            vendor: "gemini",
            source: VendorError::InvalidResponse("quota exceeded for key sk-123".to_string()),
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Failed to process the request." }));
    }
}
