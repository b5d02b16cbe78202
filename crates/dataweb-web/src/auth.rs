//! Authentication and access logging middleware: Basic Auth, Access Log.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use base64::Engine;
use tracing::{debug, info, warn};

/// Paths served without credentials.
const PUBLIC_PATHS: &[&str] = &["/api/v1/health"];

/// Authenticated username, inserted into request extensions by auth middleware.
#[derive(Clone)]
pub(crate) struct AuthUser(pub(crate) String);

// ============================================================
// Access log layer (tower Layer + Service)
// ============================================================

#[derive(Clone)]
pub(crate) struct AccessLogLayer;

impl<S> tower::Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;
    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

#[derive(Clone)]
pub(crate) struct AccessLogService<S> {
    inner: S,
}

impl<S> tower::Service<Request> for AccessLogService<S>
where
    S: tower::Service<Request, Response = axum::response::Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let client = req
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .unwrap_or_else(|| "-".to_owned());
        let t0 = Instant::now();

        let mut inner = self.inner.clone();
        Box::pin(async move {
            let response = inner.call(req).await?;
            let latency_ms = t0.elapsed().as_millis() as u64;
            let status = response.status().as_u16();
            let user = response
                .extensions()
                .get::<AuthUser>()
                .map(|u| u.0.clone())
                .unwrap_or_else(|| "-".to_owned());
            if path != "/favicon.ico" {
                info!(client, user, status, latency_ms, "{method} {path}");
            }
            Ok(response)
        })
    }
}

// ============================================================
// Basic Auth middleware
// ============================================================

/// Expected `user:password` pair for Basic Auth.
pub(crate) type Credentials = Arc<(String, String)>;

/// Extracts `(user, password)` from an `Authorization: Basic …` header value.
pub(crate) fn decode_basic(header_value: &str) -> Result<(String, String), &'static str> {
    let encoded = header_value
        .strip_prefix("Basic ")
        .ok_or("not basic auth")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| "invalid base64")?;
    let decoded = String::from_utf8(decoded).map_err(|_| "invalid utf8")?;
    let (user, pass) = decoded
        .split_once(':')
        .ok_or("malformed credentials")?;
    Ok((user.to_owned(), pass.to_owned()))
}

fn unauthorized() -> axum::response::Response {
    let mut resp = axum::response::Response::new(Body::from("Unauthorized"));
    *resp.status_mut() = StatusCode::UNAUTHORIZED;
    resp.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        header::HeaderValue::from_static("Basic realm=\"dataweb\""),
    );
    resp
}

pub(crate) async fn basic_auth_middleware(
    State(creds): State<Credentials>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let path = req.uri().path().to_owned();
    if PUBLIC_PATHS.contains(&path.as_str()) {
        return next.run(req).await;
    }

    let auth_str = match req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str())
    {
        Some(Ok(s)) => s,
        Some(Err(_)) => {
            warn!(path = %path, "auth failed: invalid header encoding");
            return unauthorized();
        }
        None => {
            warn!(path = %path, "auth failed: no authorization header");
            return unauthorized();
        }
    };

    let (user, pass) = match decode_basic(auth_str) {
        Ok(pair) => pair,
        Err(reason) => {
            warn!(path = %path, reason, "auth failed");
            return unauthorized();
        }
    };

    if user != creds.0 || pass != creds.1 {
        warn!(user = %user, path = %path, "auth failed: invalid credentials");
        return unauthorized();
    }

    debug!(user = %user, path = %path, "authenticated");
    let mut response = next.run(req).await;
    response.extensions_mut().insert(AuthUser(user));
    response
}
