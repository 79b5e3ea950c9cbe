//! Heuristic media extraction from raw HTML
//!
//! No DOM is built. Each piece of information comes from a small independent
//! pattern extractor so that each can be tested on its own:
//!
//! - [`extract_title`]: text of the first `<title>` element
//! - [`extract_meta_content`]: `content` of the first `<meta>` whose
//!   `property`/`name` matches, in either attribute order
//! - [`extract_direct_links`]: every absolute `.mp4`/`.m3u8` URL in the
//!   document, including JSON-escaped ones inside inline scripts
//!
//! [`MediaExtractor`] composes them into an [`ExtractedPage`].

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::errors::{AppError, AppResult};
use crate::models::MediaCandidate;
use crate::utils::url::UrlUtils;

/// Message reported when a page holds neither media nor a cover image
pub const NO_MEDIA_MESSAGE: &str =
    "No direct media found. The post may be private, removed, or require login.";

const OG_IMAGE: &[&str] = &["og:image", "og:image:url", "og:image:secure_url"];
const OG_VIDEO: &[&str] = &["og:video", "og:video:url", "og:video:secure_url"];
const OG_TITLE: &[&str] = &["og:title"];

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid title regex"));

static META_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta regex"));

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z][a-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

static UNICODE_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\\u002f").expect("valid escape regex"));

static UNICODE_AMPERSAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\\u0026").expect("valid escape regex"));

/// Candidate URL tokens; media links are picked out by their path afterwards
static URL_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>\\(){}\[\]]+"#).expect("valid url token regex")
});

const MEDIA_EXTENSIONS: &[&str] = &["mp4", "m3u8"];

/// Title, cover image and media candidates found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub cover_image_url: Option<String>,
    pub media: Vec<MediaCandidate>,
}

impl ExtractedPage {
    /// Nothing usable: no media and no cover image
    pub fn is_empty(&self) -> bool {
        self.media.is_empty() && self.cover_image_url.is_none()
    }
}

/// Composes the pattern extractors
pub struct MediaExtractor;

impl MediaExtractor {
    /// Scan a document for a title, cover image and media candidates.
    ///
    /// Returns [`AppError::NoMediaFound`] when neither media nor a cover image
    /// was located.
    pub fn extract(html: &str) -> AppResult<ExtractedPage> {
        let title = extract_title(html);
        let cover_image_url = extract_meta_content(html, OG_IMAGE).and_then(absolute_http_url);
        let og_video = extract_meta_content(html, OG_VIDEO).and_then(absolute_http_url);

        let mut links = extract_direct_links(html);
        if let Some(video) = og_video
            && !links.contains(&video)
        {
            links.push(video);
        }

        let page = ExtractedPage {
            title,
            cover_image_url,
            media: links.into_iter().map(MediaCandidate::from_url).collect(),
        };

        if page.is_empty() {
            return Err(AppError::no_media_found(NO_MEDIA_MESSAGE));
        }
        Ok(page)
    }

    /// Preview title (`og:title`, else `<title>`) and image (`og:image`)
    pub fn extract_preview(html: &str) -> (Option<String>, Option<String>) {
        let title = extract_meta_content(html, OG_TITLE).or_else(|| extract_title(html));
        let image = extract_meta_content(html, OG_IMAGE).and_then(absolute_http_url);
        (title, image)
    }
}

/// Trimmed text of the first `<title>` element
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|title| !title.is_empty())
}

/// `content` of the first `<meta>` tag whose `property` or `name` equals one
/// of `keys`. Earlier keys win over later ones.
pub fn extract_meta_content(html: &str, keys: &[&str]) -> Option<String> {
    let tags: Vec<Vec<(String, String)>> = META_TAG_RE
        .find_iter(html)
        .map(|tag| parse_attributes(tag.as_str()))
        .collect();

    keys.iter().find_map(|key| {
        tags.iter().find_map(|attributes| {
            let matches_key = attributes.iter().any(|(name, value)| {
                (name == "property" || name == "name") && value.trim().eq_ignore_ascii_case(key)
            });
            if !matches_key {
                return None;
            }
            attributes
                .iter()
                .find(|(name, _)| name == "content")
                .map(|(_, content)| decode_entities(content.trim()))
                .filter(|content| !content.is_empty())
        })
    })
}

fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE_RE
        .captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((name, value))
        })
        .collect()
}

/// Every unique absolute `.mp4`/`.m3u8` URL, in order of first appearance
pub fn extract_direct_links(html: &str) -> Vec<String> {
    let normalized = unescape_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for token in URL_TOKEN_RE.find_iter(&normalized) {
        if let Some(url) = media_link(token.as_str())
            && seen.insert(url.to_string())
        {
            links.push(url.to_string());
        }
    }

    links
}

/// The token up to its fragment, if its path ends in a media extension.
///
/// Sentence punctuation trailing the token is dropped; `a.mp4.jpg`,
/// `a.mp4v` and hosts like `v.mp4.cdn.test` with other paths are not media.
fn media_link(token: &str) -> Option<&str> {
    let token = token.trim_end_matches(['.', ',', ';', ':', '!']);
    let link = token.split('#').next().unwrap_or(token);
    let parsed = UrlUtils::parse_http_url(link)?;
    let path = parsed.path().to_ascii_lowercase();
    MEDIA_EXTENSIONS
        .iter()
        .any(|extension| {
            path.rsplit_once('.')
                .is_some_and(|(stem, found)| !stem.ends_with('/') && found == *extension)
        })
        .then_some(link)
}

/// Undo the escaping that hides URLs inside JSON and HTML attributes
fn unescape_document(html: &str) -> String {
    let unescaped = html.replace("\\/", "/");
    let unescaped = UNICODE_SLASH_RE.replace_all(&unescaped, "/");
    let unescaped = UNICODE_AMPERSAND_RE.replace_all(&unescaped, "&");
    unescaped.replace("&quot;", "\"").replace("&amp;", "&")
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Accept absolute HTTP(S) URLs; upgrade protocol-relative ones to https
fn absolute_http_url(candidate: String) -> Option<String> {
    let candidate = match candidate.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => candidate,
    };
    UrlUtils::is_http_url(&candidate).then_some(candidate)
}
