//! HEAD probe: check a URL's declared content type without downloading it

use tracing::{debug, info};

use crate::errors::{AppError, AppResult};
use crate::models::ProbeResult;
use crate::utils::content_type::is_allowed_media_type;
use crate::utils::url::UrlUtils;
use crate::utils::{FetchRequest, FetchedResponse, RemoteFetcher};

#[derive(Clone)]
pub struct ProbeService {
    fetcher: RemoteFetcher,
}

impl ProbeService {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self { fetcher }
    }

    /// Probe `url` with HEAD, falling back to a two-byte ranged GET when HEAD
    /// fails or carries no content type, then apply the media allowlist.
    pub async fn probe(&self, url: &str) -> AppResult<ProbeResult> {
        let url = UrlUtils::require_http_url("url", url)?;

        let (content_type, content_length) = match self.head(url.as_str()).await {
            Some(found) => found,
            None => self.ranged_get(url.as_str()).await?,
        };

        match content_type {
            Some(content_type) if is_allowed_media_type(&content_type) => {
                Ok(ProbeResult::allowed(content_type, content_length))
            }
            other => {
                info!(
                    url = %UrlUtils::obfuscate_credentials(url.as_str()),
                    content_type = other.as_deref().unwrap_or(""),
                    "Probe rejected content type"
                );
                Ok(ProbeResult::rejected(
                    "Content type is not an allowed media type",
                    other,
                    content_length,
                ))
            }
        }
    }

    /// Headers from a HEAD request, or `None` when they are not informative
    async fn head(&self, url: &str) -> Option<(Option<String>, Option<u64>)> {
        match self.fetcher.send(FetchRequest::head(url)).await {
            Ok(response) if response.status().is_success() => {
                let content_type = response.content_type().map(str::to_string)?;
                Some((Some(content_type), response.content_length()))
            }
            Ok(response) => {
                debug!(status = response.status().as_u16(), "HEAD unsuccessful, falling back");
                None
            }
            Err(e) => {
                debug!(error = %e, "HEAD failed, falling back");
                None
            }
        }
    }

    async fn ranged_get(&self, url: &str) -> AppResult<(Option<String>, Option<u64>)> {
        let response: FetchedResponse = self.fetcher.send(FetchRequest::range(url, 0, 1)).await?;
        if !response.status().is_success() {
            return Err(AppError::upstream(response.status()));
        }

        let content_length = response
            .content_range_total()
            .or_else(|| response.content_length());
        Ok((response.content_type().map(str::to_string), content_length))
    }
}
