//! Request-scoped data model
//!
//! Everything here is built while handling one inbound request and dropped
//! at the end of it. Field names on the wire follow the JSON API.

use serde::{Deserialize, Serialize};

use crate::utils::content_type::mime_type_for_url;

/// A directly fetchable media link found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaCandidate {
    pub url: String,
    /// Inferred from the URL extension, never taken from the page
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl MediaCandidate {
    pub fn from_url<S: Into<String>>(url: S) -> Self {
        let url = url.into();
        let mime_type = mime_type_for_url(&url).to_string();
        Self { url, mime_type }
    }
}

/// Outcome of resolving one page URL.
///
/// On success `page`, `title`, `cover` and `media` are present and at least one
/// of `media`/`cover` is non-empty. On failure only `error` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResult {
    pub ok: bool,
    #[serde(rename = "page", skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "cover", skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<MediaCandidate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveResult {
    pub fn success(
        page_url: String,
        title: String,
        cover_image_url: String,
        media: Vec<MediaCandidate>,
    ) -> Self {
        Self {
            ok: true,
            page_url: Some(page_url),
            title: Some(title),
            cover_image_url: Some(cover_image_url),
            media: Some(media),
            error: None,
        }
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        Self {
            ok: false,
            page_url: None,
            title: None,
            cover_image_url: None,
            media: None,
            error: Some(error.into()),
        }
    }

    pub fn media(&self) -> &[MediaCandidate] {
        self.media.as_deref().unwrap_or_default()
    }
}

/// Outcome of a HEAD probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn allowed(content_type: String, content_length: Option<u64>) -> Self {
        Self {
            ok: true,
            content_type: Some(content_type),
            content_length,
            error: None,
        }
    }

    pub fn rejected<S: Into<String>>(
        error: S,
        content_type: Option<String>,
        content_length: Option<u64>,
    ) -> Self {
        Self {
            ok: false,
            content_type,
            content_length,
            error: Some(error.into()),
        }
    }
}

/// Query parameters of a download; every field is untrusted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(rename = "url", default)]
    pub source_url: String,
    #[serde(rename = "filename", default)]
    pub desired_filename: String,
    #[serde(rename = "referer", default)]
    pub referer_url: Option<String>,
}

/// Open Graph preview of an arbitrary page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageMetadata {
    pub fn found(title: String, image: String) -> Self {
        Self {
            ok: true,
            title: Some(title),
            image: Some(image),
            error: None,
        }
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        Self {
            ok: false,
            title: None,
            image: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_candidate_mime_type() {
        assert_eq!(
            MediaCandidate::from_url("https://x.test/a.mp4").mime_type,
            "video/mp4"
        );
        assert_eq!(
            MediaCandidate::from_url("https://x.test/a.m3u8").mime_type,
            "application/vnd.apple.mpegurl"
        );
    }

    #[test]
    fn test_resolve_result_wire_shape() {
        let ok = ResolveResult::success(
            "https://x.test/p".to_string(),
            "Cat".to_string(),
            String::new(),
            vec![MediaCandidate::from_url("https://x.test/v.mp4")],
        );
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({
                "ok": true,
                "page": "https://x.test/p",
                "title": "Cat",
                "cover": "",
                "media": [{"url": "https://x.test/v.mp4", "type": "video/mp4"}]
            })
        );

        let failed = ResolveResult::failure("no direct media found");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"ok": false, "error": "no direct media found"})
        );
    }

    #[test]
    fn test_probe_result_uses_camel_case() {
        let probe = ProbeResult::allowed("video/mp4".to_string(), Some(10));
        assert_eq!(
            serde_json::to_value(&probe).unwrap(),
            json!({"ok": true, "contentType": "video/mp4", "contentLength": 10})
        );
    }
}
