use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::AuthResult;
use super::error::AuthError;

// Unknown key ids trigger a refetch, but not more often than this
const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(30);

enum KeySource {
    Remote { client: reqwest::Client, url: String },
    Static,
}

struct CachedKeys {
    set: JwkSet,
    fetched_at: Instant,
}

/// The host platform's public signing keys, fetched lazily and kept for
/// `refresh` before they are fetched again.
pub struct JwksCache {
    source: KeySource,
    refresh: Duration,
    keys: RwLock<Option<CachedKeys>>,
}

impl JwksCache {
    pub fn remote(url: impl Into<String>, refresh: Duration, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            source: KeySource::Remote {
                client,
                url: url.into(),
            },
            refresh,
            keys: RwLock::new(None),
        })
    }

    /// A fixed key set that is never refetched.
    pub fn from_static(set: JwkSet) -> Self {
        Self {
            source: KeySource::Static,
            refresh: Duration::MAX,
            keys: RwLock::new(Some(CachedKeys {
                set,
                fetched_at: Instant::now(),
            })),
        }
    }

    pub async fn decoding_key(&self, kid: &str) -> AuthResult<DecodingKey> {
        {
            let keys = self.keys.read().await;
            if let Some(cached) = keys.as_ref() {
                let fresh = cached.fetched_at.elapsed() < self.refresh;
                if fresh {
                    if let Some(key) = find_key(&cached.set, kid)? {
                        return Ok(key);
                    }
                    if cached.fetched_at.elapsed() < MIN_REFETCH_INTERVAL {
                        debug!(kid, "Unknown signing key id, keys were fetched recently");
                        return Err(AuthError::UnknownKey);
                    }
                }
            }
        }

        let KeySource::Remote { client, url } = &self.source else {
            return Err(AuthError::UnknownKey);
        };

        let mut keys = self.keys.write().await;

        // Another request may have refreshed while we waited for the lock
        if let Some(cached) = keys.as_ref() {
            if cached.fetched_at.elapsed() < MIN_REFETCH_INTERVAL {
                return find_key(&cached.set, kid)?.ok_or(AuthError::UnknownKey);
            }
        }

        let set = fetch(client, url).await?;
        let key = find_key(&set, kid)?;
        *keys = Some(CachedKeys {
            set,
            fetched_at: Instant::now(),
        });

        key.ok_or(AuthError::UnknownKey)
    }
}

fn find_key(set: &JwkSet, kid: &str) -> AuthResult<Option<DecodingKey>> {
    let Some(jwk) = set.find(kid) else {
        return Ok(None);
    };

    DecodingKey::from_jwk(jwk).map(Some).map_err(|e| {
        warn!(kid, "Unusable signing key: {}", e);
        AuthError::UnknownKey
    })
}

async fn fetch(client: &reqwest::Client, url: &str) -> AuthResult<JwkSet> {
    debug!(url, "Fetching signing keys");

    let response = client.get(url).send().await.map_err(|e| {
        error!(url, "Signing key fetch failed: {}", e);
        AuthError::KeyFetch
    })?;

    if !response.status().is_success() {
        error!(url, status = %response.status(), "Signing key endpoint returned an error");
        return Err(AuthError::KeyFetch);
    }

    response.json::<JwkSet>().await.map_err(|e| {
        error!(url, "Signing key set is not valid JWKS: {}", e);
        AuthError::KeyFetch
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::header::CONTENT_TYPE, routing::get};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const JWKS: &str = include_str!("../../tests/fixtures/jwks.json");

    fn cache() -> JwksCache {
        JwksCache::from_static(serde_json::from_str(JWKS).unwrap())
    }

    #[tokio::test]
    async fn static_keys_resolve_known_kid() {
        assert!(cache().decoding_key("test-key").await.is_ok());
    }

    #[tokio::test]
    async fn unknown_kid_is_unauthorized() {
        let result = cache().decoding_key("missing").await;
        assert!(matches!(result, Err(AuthError::UnknownKey)));
    }

    #[tokio::test(start_paused = true)]
    async fn static_keys_never_refetch() {
        let cache = cache();
        tokio::time::advance(Duration::from_secs(120)).await;
        let result = cache.decoding_key("missing").await;
        assert!(matches!(result, Err(AuthError::UnknownKey)));
        assert!(cache.decoding_key("test-key").await.is_ok());
    }

    // Serves the fixture key set on a local port and counts fetches
    async fn serve_jwks(hits: Arc<AtomicUsize>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/jwks",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    ([(CONTENT_TYPE, "application/json")], JWKS)
                }
            }),
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/jwks")
    }

    // A local address nothing listens on
    async fn closed_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/jwks")
    }

    fn remote(url: String) -> JwksCache {
        JwksCache::remote(url, Duration::from_secs(3600), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn remote_keys_are_fetched_once_within_refresh() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = remote(serve_jwks(hits.clone()).await);

        assert!(cache.decoding_key("test-key").await.is_ok());
        assert!(cache.decoding_key("test-key").await.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kid_refetch_is_throttled() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = remote(serve_jwks(hits.clone()).await);

        assert!(cache.decoding_key("test-key").await.is_ok());
        let result = cache.decoding_key("rotated").await;
        assert!(matches!(result, Err(AuthError::UnknownKey)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_lookup_of_unknown_kid_fetches() {
        let hits = Arc::new(AtomicUsize::new(0));
        let cache = remote(serve_jwks(hits.clone()).await);

        let result = cache.decoding_key("rotated").await;
        assert!(matches!(result, Err(AuthError::UnknownKey)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_key_endpoint_is_a_fetch_error() {
        let cache = remote(closed_url().await);

        let result = cache.decoding_key("test-key").await;
        assert!(matches!(result, Err(AuthError::KeyFetch)));
        assert!(!AuthError::KeyFetch.is_caller_error());
    }
}
