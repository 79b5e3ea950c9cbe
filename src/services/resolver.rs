//! Resolver pipeline: page URL in, media candidates out
//!
//! The pipeline is linear: `Validating -> Fetching -> Extracting -> Done`.
//! Exactly one outbound GET is made per call and nothing is written.

use std::fmt;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::extractor::MediaExtractor;
use crate::models::ResolveResult;
use crate::utils::url::UrlUtils;
use crate::utils::{FetchRequest, RemoteFetcher};

/// Stage of a resolve call, carried in log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    Validating,
    Fetching,
    Extracting,
}

impl fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct ResolverService {
    fetcher: RemoteFetcher,
}

impl ResolverService {
    pub fn new(fetcher: RemoteFetcher) -> Self {
        Self { fetcher }
    }

    /// Resolve a post URL.
    ///
    /// Invalid input and network failures are errors. A page that was reached
    /// but held nothing usable is a normal `ok: false` result.
    pub async fn resolve(&self, page_url: &str) -> AppResult<ResolveResult> {
        debug!(stage = %ResolveStage::Validating, "Resolving page");
        let url = UrlUtils::require_http_url("url", page_url)?;

        debug!(
            stage = %ResolveStage::Fetching,
            url = %UrlUtils::obfuscate_credentials(url.as_str()),
            "Fetching page"
        );
        let response = self.fetcher.send(FetchRequest::page(url.as_str())).await?;
        let final_url = response.final_url().to_string();
        if !response.status().is_success() {
            // Some hosts answer crawlers with an error status but a full page
            warn!(
                status = response.status().as_u16(),
                url = %UrlUtils::obfuscate_credentials(&final_url),
                "Page returned a non-success status, scanning body anyway"
            );
        }
        let html = response.text().await?;

        debug!(stage = %ResolveStage::Extracting, bytes = html.len(), "Scanning page");
        match MediaExtractor::extract(&html) {
            Ok(page) => {
                info!(
                    url = %UrlUtils::obfuscate_credentials(&final_url),
                    media = page.media.len(),
                    has_cover = page.cover_image_url.is_some(),
                    "Resolved page"
                );
                Ok(ResolveResult::success(
                    final_url,
                    page.title.unwrap_or_default(),
                    page.cover_image_url.unwrap_or_default(),
                    page.media,
                ))
            }
            Err(AppError::NoMediaFound { message }) => {
                info!(
                    url = %UrlUtils::obfuscate_credentials(&final_url),
                    "No media found on page"
                );
                Ok(ResolveResult::failure(message))
            }
            Err(e) => Err(e),
        }
    }
}
