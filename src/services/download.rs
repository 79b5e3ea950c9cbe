//! Download proxy: re-serve a media URL with a safe attachment filename
//!
//! The upstream body is streamed through chunk by chunk; nothing is buffered
//! beyond what is in flight. Dropping [`ProxiedDownload::body`] (for example
//! when the client disconnects) drops the upstream connection with it.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use tracing::{info, warn};

use crate::errors::{AppError, AppResult};
use crate::models::DownloadRequest;
use crate::utils::content_type::{self, OCTET_STREAM};
use crate::utils::filename::{content_disposition, sanitize_filename};
use crate::utils::url::UrlUtils;
use crate::utils::{FetchRequest, RemoteFetcher};

/// Headers and body of an upstream response ready to be relayed
pub struct ProxiedDownload {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub content_disposition: String,
    pub filename: String,
    pub body: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl std::fmt::Debug for ProxiedDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxiedDownload")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct DownloadService {
    fetcher: RemoteFetcher,
    default_filename: String,
    enforce_media_gate: bool,
}

impl DownloadService {
    pub fn new(fetcher: RemoteFetcher, default_filename: String, enforce_media_gate: bool) -> Self {
        Self {
            fetcher,
            default_filename,
            enforce_media_gate,
        }
    }

    /// Start relaying `request.source_url`.
    ///
    /// Fails before any body byte is sent when the URL is invalid, the upstream
    /// is unreachable, answers with a non-success status, or (when the gate is
    /// enforced) declares a non-media content type.
    pub async fn start(&self, request: &DownloadRequest) -> AppResult<ProxiedDownload> {
        let source = UrlUtils::require_http_url("url", &request.source_url)?;
        let stem = sanitize_filename(&request.desired_filename)
            .or_else(|| sanitize_filename(&self.default_filename))
            .unwrap_or_else(|| "download".to_string());

        let response = self
            .fetcher
            .send(FetchRequest::download(
                source.as_str(),
                request.referer_url.as_deref(),
            ))
            .await?;

        if !response.status().is_success() {
            warn!(
                status = response.status().as_u16(),
                url = %UrlUtils::obfuscate_credentials(source.as_str()),
                "Upstream refused download"
            );
            return Err(AppError::upstream(response.status()));
        }

        let declared = response.content_type().map(str::to_string);
        if self.enforce_media_gate
            && !declared
                .as_deref()
                .is_some_and(content_type::is_allowed_media_type)
        {
            return Err(AppError::unsupported_content_type(
                declared.unwrap_or_default(),
            ));
        }

        let extension = content_type::extension_for(declared.as_deref(), source.as_str());
        let filename = format!("{stem}.{extension}");
        let content_length = response.content_length();

        info!(
            url = %UrlUtils::obfuscate_credentials(source.as_str()),
            filename = %filename,
            content_type = declared.as_deref().unwrap_or(OCTET_STREAM),
            content_length = ?content_length,
            "Relaying download"
        );

        Ok(ProxiedDownload {
            content_type: declared.unwrap_or_else(|| OCTET_STREAM.to_string()),
            content_length,
            content_disposition: content_disposition(&stem, &extension),
            filename,
            body: response.bytes_stream().boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(enforce_media_gate: bool) -> DownloadService {
        let fetcher = RemoteFetcher::new(&UpstreamConfig::default()).unwrap();
        DownloadService::new(fetcher, "download".to_string(), enforce_media_gate)
    }

    fn request(url: String, filename: &str) -> DownloadRequest {
        DownloadRequest {
            source_url: url,
            desired_filename: filename.to_string(),
            referer_url: None,
        }
    }

    async fn collect(download: ProxiedDownload) -> Vec<u8> {
        let mut body = download.body;
        let mut out = Vec::new();
        while let Some(chunk) = body.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_streams_body_with_sanitized_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v.mp4"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"fake-mp4-bytes".to_vec(), "video/mp4"),
            )
            .mount(&server)
            .await;

        let download = service(false)
            .start(&request(format!("{}/v.mp4", server.uri()), "../../etc/passwd"))
            .await
            .unwrap();

        assert_eq!(download.content_type, "video/mp4");
        assert_eq!(download.filename, "etc_passwd.mp4");
        assert_eq!(
            download.content_disposition,
            "attachment; filename=\"etc_passwd.mp4\""
        );
        assert_eq!(collect(download).await, b"fake-mp4-bytes");
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_not_streamed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let err = service(false)
            .start(&request(format!("{}/gone.mp4", server.uri()), "clip"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 404 }));
    }

    #[tokio::test]
    async fn test_default_filename_and_manifest_extension() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"#EXTM3U".to_vec()))
            .mount(&server)
            .await;

        let download = service(false)
            .start(&request(format!("{}/live/index.m3u8", server.uri()), "///"))
            .await
            .unwrap();
        assert_eq!(download.filename, "download.m3u8");
    }

    #[tokio::test]
    async fn test_referer_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(header("referer", "https://www.example.com/explore/1"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/jpeg"))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request(format!("{}/cover", server.uri()), "cover");
        req.referer_url = Some("https://www.example.com/explore/1".to_string());
        let download = service(false).start(&req).await.unwrap();
        assert_eq!(download.filename, "cover.jpg");
    }

    #[tokio::test]
    async fn test_gate_when_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html>internal</html>", "text/html"),
            )
            .mount(&server)
            .await;
        let url = format!("{}/admin", server.uri());

        let err = service(true).start(&request(url.clone(), "x")).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedContentType { .. }));

        let relayed = service(false).start(&request(url, "x")).await.unwrap();
        assert_eq!(relayed.filename, "x.html");
    }

    #[tokio::test]
    async fn test_invalid_source_url() {
        let err = service(false)
            .start(&request("file:///etc/passwd".to_string(), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
    }
}
