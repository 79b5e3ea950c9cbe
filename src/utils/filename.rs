//! Filename sanitization and `Content-Disposition` construction

const MAX_FILENAME_CHARS: usize = 120;
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', ';', '%'];

/// Sanitize an untrusted filename into a single safe path segment.
///
/// - Replaces separators, reserved characters, control characters and
///   whitespace with `_`, collapsing runs
/// - Collapses runs of dots so `..` never survives
/// - Trims leading/trailing dots, underscores and spaces
/// - Limits the result to a fixed number of characters
///
/// Returns `None` when nothing usable remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        let replacement = if c.is_control() || c.is_whitespace() || RESERVED.contains(&c) {
            '_'
        } else {
            c
        };

        match (replacement, out.chars().last()) {
            ('_', Some('_')) | ('.', Some('.')) => {}
            _ => out.push(replacement),
        }
    }

    let trimmed: String = out
        .trim_matches(|c| c == '.' || c == '_' || c == ' ')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();
    let trimmed = trimmed.trim_end_matches(['.', '_']);

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// ASCII-only variant for the plain `filename=` parameter
fn ascii_fallback(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { '_' })
        .collect();
    sanitize_filename(&mapped).unwrap_or_else(|| "download".to_string())
}

/// Build an `attachment` disposition for an already sanitized stem and extension.
///
/// The plain `filename` carries an ASCII rendition; `filename*` carries the
/// UTF-8 original percent-encoded so non-Latin titles survive.
pub fn content_disposition(stem: &str, extension: &str) -> String {
    let full = format!("{stem}.{extension}");
    let ascii = format!("{}.{extension}", ascii_fallback(stem));

    if ascii == full {
        format!("attachment; filename=\"{full}\"")
    } else {
        format!(
            "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
            urlencoding::encode(&full)
        )
    }
}
