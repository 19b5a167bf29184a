use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use super::error::AuthError;
use super::jwt::JwtAuth;
use crate::metrics::AUTH_REJECTIONS;
use axum::body::Body;
use axum::http::{self, HeaderValue, Request, Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use tower::Layer;

/// Rejects requests without a valid host token before they reach a handler.
/// Verified requests carry an [`AuthContext`](super::AuthContext) extension.
#[derive(Clone)]
pub struct AuthLayer(Arc<JwtAuth>);

impl AuthLayer {
    pub fn new(jwt: JwtAuth) -> Self {
        Self(Arc::new(jwt))
    }
}

impl<Service> Layer<Service> for AuthLayer
where
    Service: Send + Clone,
{
    type Service = AuthService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        AuthService {
            next,
            jwt: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AuthService<Service> {
    next: Service,
    jwt: Arc<JwtAuth>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for AuthService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Send + Clone + 'static,
    Service::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = http::Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let mut next = self.next.clone();
        let jwt = self.jwt.clone();

        Box::pin(async move {
            let (mut parts, body) = req.into_parts();

            match jwt.authenticate(&parts).await {
                Ok(context) => {
                    parts.extensions.insert(context);
                    next.call(Request::from_parts(parts, body)).await
                }
                Err(auth_error) => {
                    AUTH_REJECTIONS.inc();
                    warn!(path = %parts.uri.path(), "Request rejected: {}", auth_error);
                    Ok(rejection(auth_error))
                }
            }
        })
    }
}

fn rejection(auth_error: AuthError) -> Response<Body> {
    #[derive(Serialize)]
    struct Content {
        error: &'static str,
    }

    let (status_code, error) = if auth_error.is_caller_error() {
        (StatusCode::UNAUTHORIZED, "Unauthorized")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };

    let body = serde_json::to_vec(&Content { error }).unwrap_or_default();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status_code;
    let headers = response.headers_mut();
    headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if status_code == StatusCode::UNAUTHORIZED {
        headers.insert(http::header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
}
