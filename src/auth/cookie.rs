// Access token cookie handling

use axum::http::{header, HeaderMap};

/// Access token cookie configuration
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub path: String,
    pub max_age_secs: i64,
}

impl CookieConfig {
    /// Build the Set-Cookie header value carrying an access token
    pub fn build_set_cookie(&self, value: &str) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.name, value);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Lax");
        cookie.push_str(&format!("; Path={}", self.path));
        cookie.push_str(&format!("; Max-Age={}", self.max_age_secs));
        cookie
    }

    /// Build the Set-Cookie header value that clears the access token
    pub fn build_delete_cookie(&self) -> String {
        format!("{}=; HttpOnly; Path={}; Max-Age=0", self.name, self.path)
    }
}

/// Extract a cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> CookieConfig {
        CookieConfig {
            name: "access-token".to_string(),
            secure: false,
            path: "/".to_string(),
            max_age_secs: 7200,
        }
    }

    #[test]
    fn test_set_cookie_carries_max_age_and_http_only() {
        let cookie = config().build_set_cookie("abc");
        assert!(cookie.starts_with("access-token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_secure_flag() {
        let mut cfg = config();
        cfg.secure = true;
        assert!(cfg.build_set_cookie("abc").contains("; Secure"));
    }

    #[test]
    fn test_extract_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access-token=tok.en.value; lang=en"),
        );

        assert_eq!(
            extract_cookie(&headers, "access-token").as_deref(),
            Some("tok.en.value")
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_extract_cookie_without_header() {
        assert_eq!(extract_cookie(&HeaderMap::new(), "access-token"), None);
    }
}
