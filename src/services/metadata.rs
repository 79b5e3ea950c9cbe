//! Open Graph preview lookup for arbitrary URLs

use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::extractor::MediaExtractor;
use crate::models::PageMetadata;
use crate::utils::url::UrlUtils;
use crate::utils::{FetchRequest, RemoteFetcher};

#[derive(Clone)]
pub struct MetadataService {
    fetcher: RemoteFetcher,
}

impl MetadataService {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch a page and read its preview title and image.
    ///
    /// A page with neither is reported as [`AppError::NoMediaFound`].
    pub async fn lookup(&self, url: &str) -> AppResult<PageMetadata> {
        let url = UrlUtils::require_http_url("url", url)?;
        let response = self.fetcher.send(FetchRequest::page(url.as_str())).await?;
        if !response.status().is_success() {
            return Err(AppError::upstream(response.status()));
        }

        let html = response.text().await?;
        let (title, image) = MediaExtractor::extract_preview(&html);
        debug!(has_title = title.is_some(), has_image = image.is_some(), "Read page preview");

        if title.is_none() && image.is_none() {
            return Err(AppError::no_media_found("No preview metadata found"));
        }
        Ok(PageMetadata::found(
            title.unwrap_or_default(),
            image.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn lookup(status: u16, body: &str) -> AppResult<PageMetadata> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body, "text/html"))
            .mount(&server)
            .await;
        let service = MetadataService::new(RemoteFetcher::new(&UpstreamConfig::default()).unwrap());
        service.lookup(&format!("{}/article", server.uri())).await
    }

    #[tokio::test]
    async fn test_reads_og_tags() {
        let meta = lookup(
            200,
            r#"<meta property="og:title" content="Hello"><meta property="og:image" content="https://x.test/i.png">"#,
        )
        .await
        .unwrap();
        assert_eq!(meta, PageMetadata::found("Hello".into(), "https://x.test/i.png".into()));
    }

    #[tokio::test]
    async fn test_missing_metadata_is_soft() {
        let err = lookup(200, "<p>plain</p>").await.unwrap_err();
        assert!(err.is_soft());
    }

    #[tokio::test]
    async fn test_error_status() {
        let err = lookup(500, "<title>oops</title>").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { status: 500 }));
    }
}
