//! Request identity to cache key.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the store key for a request.
///
/// The method is upper-cased and the URL fragment dropped, so `get /a#x`
/// and `GET /a` address the same entry.
pub fn compute_entry_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let a = compute_entry_key("GET", &url("http://localhost:8000/map/"));
        let b = compute_entry_key("GET", &url("http://localhost:8000/map/"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_ignores_method_case_and_fragment() {
        let a = compute_entry_key("get", &url("http://localhost:8000/map/#layers"));
        let b = compute_entry_key("GET", &url("http://localhost:8000/map/"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_by_method() {
        let a = compute_entry_key("GET", &url("http://localhost:8000/api/cycleways/"));
        let b = compute_entry_key("HEAD", &url("http://localhost:8000/api/cycleways/"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_keeps_query() {
        let a = compute_entry_key("GET", &url("http://localhost:8000/api/cycleways/?bbox=1"));
        let b = compute_entry_key("GET", &url("http://localhost:8000/api/cycleways/?bbox=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_entry_key("GET", &url("http://localhost:8000/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
