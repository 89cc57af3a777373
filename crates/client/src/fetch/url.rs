//! URL resolution for manifest entries and intercepted requests.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for cycleways_core::Error {
    fn from(err: UrlError) -> Self {
        cycleways_core::Error::InvalidUrl(err.to_string())
    }
}

/// Resolve a URL string against the worker's origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references (`/map/`) against `origin`; absolute
///    URLs (third-party assets) are kept as-is
/// 3. Reject anything but http(s)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether `url` shares scheme, host and port with `origin`.
pub fn is_same_origin(origin: &Url, url: &Url) -> bool {
    origin.origin() == url.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:8000").unwrap()
    }

    #[test]
    fn test_resolve_relative() {
        let url = resolve(&origin(), "/map/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/map/");
    }

    #[test]
    fn test_resolve_absolute_third_party() {
        let url = resolve(&origin(), "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css").unwrap();
        assert_eq!(url.host_str(), Some("unpkg.com"));
        assert!(!is_same_origin(&origin(), &url));
    }

    #[test]
    fn test_resolve_lowercases_host() {
        let url = resolve(&origin(), "https://UNPKG.COM/leaflet.js").unwrap();
        assert_eq!(url.host_str(), Some("unpkg.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&origin(), "/map/#dublin").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/map/");
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&origin(), "/api/cycleways/?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /offline/  ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/offline/");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let url = resolve(&origin(), "/api/dublin-bikes/").unwrap();
        assert!(is_same_origin(&origin(), &url));
    }
}
