use axum::http::{header::AUTHORIZATION, request::Parts};
use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::Deserialize;
use tracing::debug;

use super::AuthResult;
use super::error::AuthError;
use super::jwks::JwksCache;
use crate::config::AppId;

/// Caller identity established from a verified host token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub app_id: String,
    pub brand_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostClaims {
    aud: String,
    brand_id: String,
    user_id: String,
}

pub struct JwtAuth {
    keys: JwksCache,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(app_id: &AppId, keys: JwksCache) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[app_id.as_str()]);
        validation.validate_exp = true;

        Self { keys, validation }
    }

    pub async fn authenticate(&self, parts: &Parts) -> AuthResult<AuthContext> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;

        let header = decode_header(token).map_err(|e| {
            debug!("Malformed token header: {}", e);
            AuthError::InvalidToken
        })?;

        if header.alg != Algorithm::RS256 {
            debug!(alg = ?header.alg, "Token signed with unexpected algorithm");
            return Err(AuthError::InvalidToken);
        }

        let kid = header.kid.ok_or_else(|| {
            debug!("Token header has no key id");
            AuthError::InvalidToken
        })?;

        let key = self.keys.decoding_key(&kid).await?;

        let data = decode::<HostClaims>(token, &key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        let claims = data.claims;
        Ok(AuthContext {
            app_id: claims.aud,
            brand_id: claims.brand_id,
            user_id: claims.user_id,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
