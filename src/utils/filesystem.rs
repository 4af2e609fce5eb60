use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

const FILE_URL_SCHEME: &str = "file://";

static CONTROL_CHARS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Cc}+").unwrap());

static REPEATED_SLASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"/+").unwrap());

/// Converts a `file://` URL into a local filesystem path.
///
/// Returns `None` for any other scheme or when the percent-encoding is invalid.
pub fn local_path_from_url(url: &str) -> Option<PathBuf> {
    let encoded = url.strip_prefix(FILE_URL_SCHEME)?;
    let decoded = urlencoding::decode(encoded).ok()?;

    if decoded.is_empty() {
        return None;
    }

    Some(PathBuf::from(decoded.into_owned()))
}

/// Builds a `file://` URL for a local path, percent-encoding each segment.
pub fn file_url_from_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref().to_string_lossy();
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();

    format!("{}{}", FILE_URL_SCHEME, encoded.join("/"))
}

/// Cleans a user-supplied executable path: strips control characters, flattens
/// whitespace to plain spaces, drops `:` and `\`, and collapses repeated slashes.
pub fn sanitize_tool_path(path: &str) -> String {
    let without_controls = CONTROL_CHARS_REGEX.replace_all(path, "");
    let flattened: String = without_controls
        .chars()
        .filter(|c| *c != ':' && *c != '\\')
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    REPEATED_SLASH_REGEX
        .replace_all(&flattened, "/")
        .trim()
        .to_string()
}
