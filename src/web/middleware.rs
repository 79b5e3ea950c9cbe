//! HTTP middleware
//!
//! Request logging and security headers applied to every route.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, Method, Uri, header},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};

use crate::utils::url::UrlUtils;

static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Host named by the `url` query parameter, without credentials or path
fn target_host(uri: &Uri) -> Option<String> {
    if !uri.path().starts_with("/api/") {
        return None;
    }
    let target = url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())?;
    UrlUtils::parse_http_url(&target)?
        .host_str()
        .map(str::to_string)
}

/// Request logging middleware
///
/// Runs the request inside a span carrying a generated request id, which is
/// echoed back as `x-request-id`. API calls also log the upstream host they
/// target; the rest of the target URL is never logged here.
pub async fn request_logging_middleware(
    method: Method,
    uri: Uri,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = info_span!("request", request_id = %request_id, method = %method, path = %uri.path());

    async move {
        let target = target_host(&uri);
        info!(target_host = target.as_deref().unwrap_or("-"), "HTTP request started");

        let mut response = next.run(request).await;
        let status = response.status().as_u16();
        let duration_ms = start.elapsed().as_millis();

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
        }

        if status >= 400 {
            warn!(status, duration_ms, "HTTP request completed with error");
        } else {
            info!(status, duration_ms, "HTTP request completed");
        }
        response
    }
    .instrument(span)
    .await
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_host_for_api_calls() {
        let uri: Uri = "/api/resolve/rednote?url=https%3A%2F%2Fuser%3Apw%40cdn.test%2Fp%3Fsig%3D1"
            .parse()
            .unwrap();
        assert_eq!(target_host(&uri).as_deref(), Some("cdn.test"));
    }

    #[test]
    fn test_no_target_host_outside_api_or_without_url() {
        let health: Uri = "/health?url=https://x.test".parse().unwrap();
        let missing: Uri = "/api/og".parse().unwrap();
        let invalid: Uri = "/api/og?url=file%3A%2F%2F%2Fetc".parse().unwrap();
        assert_eq!(target_host(&health), None);
        assert_eq!(target_host(&missing), None);
        assert_eq!(target_host(&invalid), None);
    }
}
