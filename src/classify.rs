use std::collections::BTreeMap;

use crate::config::OutputFormat;

/// Path extensions this middleware will intercept.
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Query keys that mark a request as carrying a resize directive.
const RESIZE_KEYS: [&str; 3] = ["w", "h", "format"];

/// Normalized resize intent extracted from the query string.
///
/// A width or height of 0 means "derive from the aspect ratio of the
/// original"; both fields are 0 when neither was parseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directive {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Everything after the final `.` of the path, if any.
fn path_extension(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(_, ext)| ext)
}

/// True iff the request path names a resource we know how to re-encode.
/// Matches the path's actual trailing extension against the allow-list,
/// case-insensitively.
pub fn is_image_path(path: &str) -> bool {
    match path_extension(path) {
        Some(ext) => IMAGE_EXTENSIONS.iter().any(|c| ext.eq_ignore_ascii_case(c)),
        None => false,
    }
}

impl Directive {
    /// Extract a directive from the parsed query map, or `None` when no
    /// recognized resize key is present. Pure function of (path, params).
    ///
    /// `w` and `h` fall back to 0 when missing or non-numeric; a malformed
    /// dimension never fails the request. The output format comes from the
    /// `format` value when supplied, otherwise from the path extension.
    pub fn from_query(path: &str, params: &BTreeMap<String, String>) -> Option<Directive> {
        if !RESIZE_KEYS.iter().any(|k| params.contains_key(*k)) {
            return None;
        }

        let width = params
            .get("w")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let height = params
            .get("h")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);

        let format = match params.get("format") {
            Some(name) => OutputFormat::from_name(name),
            None => OutputFormat::from_name(path_extension(path).unwrap_or("")),
        };

        Some(Directive { width, height, format })
    }
}
