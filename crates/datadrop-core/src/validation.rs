//! Validation helpers for user-supplied upload metadata.

use crate::error::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Sanitize a client-supplied filename for use in download headers.
/// The result never carries path components or characters outside
/// alphanumerics plus `.-_`; storage paths never derive from it.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    if filename_only.contains("..") {
        return Err(AppError::BadRequest(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// Normalize a declared MIME type by stripping parameters and lowercasing
/// (e.g. "Text/Plain; charset=utf-8" -> "text/plain"). Anything that does
/// not look like `type/subtype` falls back to a generic binary type.
pub fn normalize_content_type(content_type: Option<&str>) -> String {
    const FALLBACK: &str = "application/octet-stream";

    let Some(raw) = content_type else {
        return FALLBACK.to_string();
    };

    let normalized = raw
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(raw)
        .to_lowercase();

    let mut parts = normalized.split('/');
    let plausible = matches!((parts.next(), parts.next(), parts.next()),
        (Some(t), Some(s), None) if !t.is_empty() && !s.is_empty())
        && normalized
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'-' | b'+'));

    if plausible {
        normalized
    } else {
        FALLBACK.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_rejects_path_traversal() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("foo/../bar").is_err());
        assert!(sanitize_filename("....").is_err());
    }

    #[test]
    fn sanitize_filename_accepts_valid_names() {
        assert_eq!(sanitize_filename("a.txt").unwrap(), "a.txt");
        assert_eq!(sanitize_filename("my-file_1.jpg").unwrap(), "my-file_1.jpg");
    }

    #[test]
    fn sanitize_filename_strips_directories_and_odd_characters() {
        assert_eq!(sanitize_filename("/etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_filename("report \"final\".pdf").unwrap(),
            "report__final_.pdf"
        );
        // Header injection has nowhere to go once quotes and CR/LF are mapped away
        assert_eq!(
            sanitize_filename("x\"\r\nContent-Type: evil").unwrap(),
            "x___Content-Type__evil"
        );
    }

    #[test]
    fn sanitize_filename_collapses_empty_to_placeholder() {
        assert_eq!(sanitize_filename("").unwrap(), "file");
        assert_eq!(sanitize_filename("???").unwrap(), "file");
    }

    #[test]
    fn normalize_content_type_strips_parameters() {
        assert_eq!(
            normalize_content_type(Some("Text/Plain; charset=utf-8")),
            "text/plain"
        );
    }

    #[test]
    fn normalize_content_type_falls_back_to_octet_stream() {
        assert_eq!(normalize_content_type(None), "application/octet-stream");
        assert_eq!(normalize_content_type(Some("")), "application/octet-stream");
        assert_eq!(
            normalize_content_type(Some("not a mime type")),
            "application/octet-stream"
        );
        assert_eq!(
            normalize_content_type(Some("a/b/c")),
            "application/octet-stream"
        );
    }
}
