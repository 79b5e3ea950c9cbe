//! Outbound HTTP for page fetches, probes and downloads
//!
//! One [`RemoteFetcher`] is built at startup and shared by every service. Each
//! call makes exactly one attempt; there is no retry policy.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{
    Client, Method, Response, StatusCode,
    header::{self, HeaderMap},
    redirect,
};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::UpstreamConfig;
use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;

/// A single outbound request
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub method: Method,
    pub url: &'a str,
    /// Forwarded only when it is itself a valid HTTP(S) URL
    pub referer: Option<&'a str>,
    /// Inclusive byte range sent as `Range: bytes=start-end`
    pub range: Option<(u64, u64)>,
    /// Send the configured `Accept-Language`
    pub with_language: bool,
    /// Apply the total request deadline; downloads leave this off
    pub bounded: bool,
}

impl<'a> FetchRequest<'a> {
    /// Page fetch: GET with language preference and a total deadline
    pub fn page(url: &'a str) -> Self {
        Self {
            method: Method::GET,
            url,
            referer: None,
            range: None,
            with_language: true,
            bounded: true,
        }
    }

    /// Streaming download: GET without a total deadline
    pub fn download(url: &'a str, referer: Option<&'a str>) -> Self {
        Self {
            method: Method::GET,
            url,
            referer,
            range: None,
            with_language: false,
            bounded: false,
        }
    }

    /// Header-only probe
    pub fn head(url: &'a str) -> Self {
        Self {
            method: Method::HEAD,
            url,
            referer: None,
            range: None,
            with_language: false,
            bounded: true,
        }
    }

    /// GET of a small leading byte range, used when HEAD is unhelpful
    pub fn range(url: &'a str, start: u64, end: u64) -> Self {
        Self {
            method: Method::GET,
            url,
            referer: None,
            range: Some((start, end)),
            with_language: false,
            bounded: true,
        }
    }
}

/// Response of a completed request; the body has not been read yet
#[derive(Debug)]
pub struct FetchedResponse {
    response: Response,
    max_text_bytes: usize,
}

impl FetchedResponse {
    /// URL after all redirects were followed
    pub fn final_url(&self) -> &Url {
        self.response.url()
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Declared `Content-Type`, if present and non-empty
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Declared `Content-Length`, parsed from the header rather than the body hint
    pub fn content_length(&self) -> Option<u64> {
        self.header_str(header::CONTENT_LENGTH)
            .and_then(|v| v.trim().parse().ok())
    }

    /// Total size from `Content-Range: bytes 0-1/12345`
    pub fn content_range_total(&self) -> Option<u64> {
        self.header_str(header::CONTENT_RANGE)
            .and_then(|v| v.rsplit_once('/'))
            .and_then(|(_, total)| total.trim().parse().ok())
    }

    fn header_str(&self, name: header::HeaderName) -> Option<&str> {
        self.response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Read the body as text, stopping after `upstream.max_page_bytes`.
    ///
    /// Bytes past the limit are never pulled off the connection. Invalid
    /// UTF-8 is replaced rather than rejected.
    pub async fn text(self) -> AppResult<String> {
        let limit = self.max_text_bytes;
        let mut body = Vec::new();
        let mut stream = self.response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let room = limit - body.len();
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                debug!(limit, "Page body truncated at limit");
                break;
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Hand the body over as a stream of chunks without buffering it
    pub fn bytes_stream(self) -> impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static {
        self.response.bytes_stream()
    }
}

/// Remote fetcher with a fixed identity header and redirect following
#[derive(Clone)]
pub struct RemoteFetcher {
    client: Client,
    user_agent: String,
    accept_language: String,
    request_timeout: Duration,
    max_page_bytes: usize,
}

impl RemoteFetcher {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout()?)
            .read_timeout(config.read_timeout()?)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            request_timeout: config.request_timeout()?,
            max_page_bytes: config.max_page_bytes,
        })
    }

    /// Perform one request. The target is validated here as well, so no
    /// caller can reach a non-HTTP(S) scheme through the fetcher.
    pub async fn send(&self, request: FetchRequest<'_>) -> AppResult<FetchedResponse> {
        let url = UrlUtils::require_http_url("url", request.url)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(header::USER_AGENT, &self.user_agent);

        if request.with_language {
            builder = builder.header(header::ACCEPT_LANGUAGE, &self.accept_language);
        }
        if let Some(referer) = request.referer.filter(|r| UrlUtils::is_http_url(r)) {
            builder = builder.header(header::REFERER, referer.trim());
        }
        if let Some((start, end)) = request.range {
            builder = builder.header(header::RANGE, format!("bytes={start}-{end}"));
        }
        if request.bounded {
            builder = builder.timeout(self.request_timeout);
        }

        debug!(
            method = %request.method,
            url = %UrlUtils::obfuscate_credentials(request.url),
            "Sending upstream request"
        );

        let response = builder.send().await?;

        debug!(
            status = response.status().as_u16(),
            final_url = %UrlUtils::obfuscate_credentials(response.url().as_str()),
            "Upstream responded"
        );

        Ok(FetchedResponse {
            response,
            max_text_bytes: self.max_page_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header as header_matcher, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> RemoteFetcher {
        let config = UpstreamConfig {
            user_agent: "resolver-test/1.0".to_string(),
            request_timeout: "2s".to_string(),
            ..UpstreamConfig::default()
        };
        RemoteFetcher::new(&config).expect("client builds")
    }

    #[tokio::test]
    async fn test_sends_identity_and_language_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .and(header_matcher("user-agent", "resolver-test/1.0"))
            .and(header_exists("accept-language"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/post", server.uri());
        let response = fetcher().send(FetchRequest::page(&url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_follows_redirects_and_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(path("/short"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "/explore/42"),
            )
            .mount(&server)
            .await;
        Mock::given(path("/explore/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let url = format!("{}/short", server.uri());
        let response = fetcher().send(FetchRequest::page(&url)).await.unwrap();
        assert_eq!(response.final_url().path(), "/explore/42");
    }

    #[tokio::test]
    async fn test_range_and_referer_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_matcher("range", "bytes=0-1"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("content-range", "bytes 0-1/2048")
                    .set_body_raw(vec![0u8, 1u8], "video/mp4"),
            )
            .mount(&server)
            .await;

        let url = format!("{}/v.mp4", server.uri());
        let response = fetcher().send(FetchRequest::range(&url, 0, 1)).await.unwrap();
        assert_eq!(response.content_type(), Some("video/mp4"));
        assert_eq!(response.content_range_total(), Some(2048));
    }

    #[tokio::test]
    async fn test_invalid_referer_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(header_matcher("referer", "https://www.example.com/post"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let url = format!("{}/file", server.uri());
        let fetcher = fetcher();

        let with_referer = fetcher
            .send(FetchRequest::download(&url, Some("https://www.example.com/post")))
            .await
            .unwrap();
        assert_eq!(with_referer.status(), StatusCode::OK);

        let without = fetcher
            .send(FetchRequest::download(&url, Some("javascript:alert(1)")))
            .await
            .unwrap();
        assert_eq!(without.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_rejects_non_http_targets_without_a_request() {
        let err = fetcher()
            .send(FetchRequest::page("file:///etc/passwd"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_failure() {
        // Port 9 (discard) on loopback is closed in test environments
        let err = fetcher()
            .send(FetchRequest::page("http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
    }

    #[tokio::test]
    async fn test_page_text_stops_at_byte_limit() {
        let server = MockServer::start().await;
        let body = format!("{}https://x.test/tail.mp4", "a".repeat(64 * 1024));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "video/mp4"))
            .mount(&server)
            .await;

        let config = UpstreamConfig {
            max_page_bytes: 1024,
            ..UpstreamConfig::default()
        };
        let url = format!("{}/big", server.uri());
        let text = RemoteFetcher::new(&config)
            .unwrap()
            .send(FetchRequest::page(&url))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(text.len(), 1024);
        assert!(!text.contains("tail.mp4"));
    }
}
