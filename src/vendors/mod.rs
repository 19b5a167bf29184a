//! Clients for the third-party services behind the proxy routes.
//!
//! Handlers only see the [`TextGenerator`] and [`PhotoSearch`] traits so the
//! HTTP clients can be swapped for fakes in tests.

mod gemini;
mod pexels;

use async_trait::async_trait;
use serde_json::Value;

pub use gemini::GeminiClient;
pub use pexels::PexelsClient;

// Longest vendor error body kept for logs
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum VendorError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vendor answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl VendorError {
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            let mut cut = ERROR_BODY_LIMIT;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Self::Status { status, body }
    }
}

/// Generative text model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_instruction: &str) -> Result<String, VendorError>;
}

/// Stock photo search. The result is the vendor's JSON, untouched.
#[async_trait]
pub trait PhotoSearch: Send + Sync {
    async fn search(&self, query: &str, per_page: Option<u32>) -> Result<Value, VendorError>;
}
