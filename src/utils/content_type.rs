//! Content-type classification
//!
//! The allowlist keeps the download proxy from relaying arbitrary content
//! (HTML pages, documents) under a media-looking URL.

use crate::utils::url::UrlUtils;

/// MIME type reported for HLS manifests
pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";
/// MIME type reported for every other direct media link
pub const VIDEO_MIME_TYPE: &str = "video/mp4";
/// Fallback when the upstream declares nothing
pub const OCTET_STREAM: &str = "application/octet-stream";

const ALLOWED_MEDIA_TYPES: &[&str] = &[
    // video
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/x-matroska",
    "video/quicktime",
    "video/mp2t",
    // audio
    "audio/mpeg",
    "audio/mp4",
    "audio/ogg",
    "audio/aac",
    "audio/wav",
    "audio/x-wav",
    "audio/webm",
    // image
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    // generic binary and streaming manifests
    "application/octet-stream",
    "application/vnd.apple.mpegurl",
    "application/x-mpegurl",
    "audio/mpegurl",
    "audio/x-mpegurl",
];

/// Lowercased MIME essence with parameters (`; charset=...`) removed
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a declared content type is an allowed media type.
///
/// Case-insensitive, tolerant of parameters. Empty or missing types fail closed.
pub fn is_allowed_media_type(content_type: &str) -> bool {
    let essence = essence(content_type);
    !essence.is_empty() && ALLOWED_MEDIA_TYPES.contains(&essence.as_str())
}

/// MIME type inferred from a media URL's extension
pub fn mime_type_for_url(url: &str) -> &'static str {
    if UrlUtils::path_has_extension(url, "m3u8") {
        HLS_MIME_TYPE
    } else {
        VIDEO_MIME_TYPE
    }
}

/// File extension for a download.
///
/// Uses the declared content type when it says something useful; otherwise
/// `m3u8` when the source URL is a manifest, else `bin`.
pub fn extension_for(content_type: Option<&str>, source_url: &str) -> String {
    if let Some(ext) = content_type.and_then(extension_from_content_type) {
        return ext;
    }
    if UrlUtils::path_has_extension(source_url, "m3u8") {
        "m3u8".to_string()
    } else {
        "bin".to_string()
    }
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
    let essence = essence(content_type);
    let (kind, subtype) = essence.split_once('/')?;

    let mapped = match (kind, subtype) {
        (_, "octet-stream") => return None,
        (_, "vnd.apple.mpegurl" | "x-mpegurl" | "mpegurl") => "m3u8",
        ("video", "quicktime") => "mov",
        ("video", "x-matroska") => "mkv",
        ("video", "mp2t") => "ts",
        ("audio", "mpeg") => "mp3",
        ("audio", "mp4") => "m4a",
        ("audio", "x-wav") => "wav",
        ("image", "jpeg") => "jpg",
        _ => {
            // first word after the slash
            let word: String = subtype
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect();
            return (!word.is_empty()).then_some(word);
        }
    };
    Some(mapped.to_string())
}
