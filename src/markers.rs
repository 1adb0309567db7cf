// Credential marker cookies
//
// Tenant database credentials ride between requests as a pair of cookies.
// Values are percent-encoded on the wire since connection URLs contain
// characters that are not valid in a cookie value.

use axum::http::{header::COOKIE, HeaderMap};

use crate::tenant::TenantCredentials;

pub const MARKER_ENDPOINT_URL: &str = "endpointURL";
pub const MARKER_ACCESS_KEY: &str = "accessKey";

/// Marker lifetime: 24 hours.
pub const MARKER_MAX_AGE_SECS: u64 = 86_400;

/// Credential markers extracted from a request's Cookie headers.
///
/// Either marker may be absent or undecodable; resolution treats any
/// incomplete set as "no tenant credentials" rather than an error.
#[derive(Clone, Default)]
pub struct MarkerSet {
    pub endpoint_url: Option<String>,
    pub access_key: Option<String>,
}

impl std::fmt::Debug for MarkerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerSet")
            .field("endpoint_url", &self.endpoint_url.as_ref().map(|_| "***"))
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl MarkerSet {
    /// Extract credential markers from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            endpoint_url: cookie_value(headers, MARKER_ENDPOINT_URL),
            access_key: cookie_value(headers, MARKER_ACCESS_KEY),
        }
    }

    /// Both markers present and non-empty, as tenant credentials.
    pub fn credentials(&self) -> Option<TenantCredentials> {
        match (&self.endpoint_url, &self.access_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some(TenantCredentials::new(url.clone(), key.clone()))
            }
            _ => None,
        }
    }
}

/// Find a named cookie across all Cookie headers and percent-decode its value.
///
/// Undecodable values count as absent.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .map(|cookie| cookie.trim())
        .find_map(|cookie| cookie.strip_prefix(&prefix))
        .and_then(|raw| urlencoding::decode(raw).ok())
        .map(|decoded| decoded.into_owned())
}

/// Build the Set-Cookie header values that issue both markers.
pub fn issue_markers(credentials: &TenantCredentials, secure: bool) -> [String; 2] {
    [
        set_cookie(MARKER_ENDPOINT_URL, credentials.endpoint_url(), MARKER_MAX_AGE_SECS, secure),
        set_cookie(MARKER_ACCESS_KEY, credentials.access_key(), MARKER_MAX_AGE_SECS, secure),
    ]
}

/// Build the Set-Cookie header values that clear both markers.
pub fn clear_markers(secure: bool) -> [String; 2] {
    [
        set_cookie(MARKER_ENDPOINT_URL, "", 0, secure),
        set_cookie(MARKER_ACCESS_KEY, "", 0, secure),
    ]
}

fn set_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name,
        urlencoding::encode(value),
        max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_parses_both_markers() {
        let headers = headers_with_cookie(
            "endpointURL=postgres%3A%2F%2Fshop%40db%3A5432%2Fshop_a; accessKey=k123",
        );
        let markers = MarkerSet::from_headers(&headers);
        assert_eq!(
            markers.endpoint_url.as_deref(),
            Some("postgres://shop@db:5432/shop_a")
        );
        assert_eq!(markers.access_key.as_deref(), Some("k123"));
        assert!(markers.credentials().is_some());
    }

    #[test]
    fn test_ignores_unrelated_cookies() {
        let headers =
            headers_with_cookie("theme=dark; endpointURL=u;  accessKey=k; session=abc");
        let markers = MarkerSet::from_headers(&headers);
        assert_eq!(markers.endpoint_url.as_deref(), Some("u"));
        assert_eq!(markers.access_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_markers_split_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("endpointURL=u"));
        headers.append(COOKIE, HeaderValue::from_static("accessKey=k"));
        let markers = MarkerSet::from_headers(&headers);
        assert!(markers.credentials().is_some());
    }

    #[test]
    fn test_missing_marker_yields_no_credentials() {
        let headers = headers_with_cookie("endpointURL=postgres%3A%2F%2Fdb%2Fshop");
        let markers = MarkerSet::from_headers(&headers);
        assert!(markers.credentials().is_none());
    }

    #[test]
    fn test_empty_marker_yields_no_credentials() {
        let headers = headers_with_cookie("endpointURL=; accessKey=k");
        let markers = MarkerSet::from_headers(&headers);
        assert!(markers.credentials().is_none());
    }

    #[test]
    fn test_undecodable_marker_counts_as_absent() {
        // %ff decodes to a byte that is not valid UTF-8.
        let headers = headers_with_cookie("endpointURL=%ff; accessKey=k");
        let markers = MarkerSet::from_headers(&headers);
        assert!(markers.endpoint_url.is_none());
        assert!(markers.credentials().is_none());
    }

    #[test]
    fn test_no_cookie_header() {
        let markers = MarkerSet::from_headers(&HeaderMap::new());
        assert!(markers.endpoint_url.is_none());
        assert!(markers.access_key.is_none());
        assert!(markers.credentials().is_none());
    }

    #[test]
    fn test_issue_markers_attributes() {
        let creds = TenantCredentials::new(
            "postgres://shop@db:5432/shop_a".to_string(),
            "k123".to_string(),
        );
        let [endpoint, key] = issue_markers(&creds, false);
        assert!(endpoint.starts_with("endpointURL=postgres%3A%2F%2Fshop%40db%3A5432%2Fshop_a;"));
        assert!(endpoint.contains("HttpOnly"));
        assert!(endpoint.contains("SameSite=Strict"));
        assert!(endpoint.contains("Path=/"));
        assert!(endpoint.contains("Max-Age=86400"));
        assert!(!endpoint.contains("Secure"));
        assert!(key.starts_with("accessKey=k123;"));
    }

    #[test]
    fn test_issue_markers_secure() {
        let creds = TenantCredentials::new("u".to_string(), "k".to_string());
        let [endpoint, key] = issue_markers(&creds, true);
        assert!(endpoint.ends_with("; Secure"));
        assert!(key.ends_with("; Secure"));
    }

    #[test]
    fn test_clear_markers() {
        let [endpoint, key] = clear_markers(false);
        assert!(endpoint.starts_with("endpointURL=;"));
        assert!(endpoint.contains("Max-Age=0"));
        assert!(key.starts_with("accessKey=;"));
        assert!(key.contains("Max-Age=0"));
    }

    #[test]
    fn test_issued_markers_parse_back() {
        let creds = TenantCredentials::new(
            "postgres://shop_a_user@db.internal:5432/shop_a".to_string(),
            "key-with-%-and-;chars".to_string(),
        );
        let [endpoint, key] = issue_markers(&creds, false);
        // Cookie value is everything before the first attribute separator.
        let cookie = format!(
            "{}; {}",
            endpoint.split(';').next().unwrap(),
            key.split(';').next().unwrap()
        );
        let markers = MarkerSet::from_headers(&headers_with_cookie(&cookie));
        let parsed = markers.credentials().unwrap();
        assert_eq!(parsed.endpoint_url(), creds.endpoint_url());
        assert_eq!(parsed.access_key(), creds.access_key());
    }

    #[test]
    fn test_debug_redacts_values() {
        let headers = headers_with_cookie("endpointURL=secret-url; accessKey=secret-key");
        let markers = MarkerSet::from_headers(&headers);
        let rendered = format!("{:?}", markers);
        assert!(!rendered.contains("secret-url"));
        assert!(!rendered.contains("secret-key"));
    }
}
