// Identity extraction middleware for protected routes

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::auth::{cookie::extract_cookie, error::AuthError, token::TokenService};

/// Identity resolved from a verified access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

/// State for the identity gate: the shared token verifier and the cookie it reads
#[derive(Clone)]
pub struct AuthGate {
    pub tokens: Arc<TokenService>,
    pub cookie_name: Arc<str>,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenService>, cookie_name: &str) -> Self {
        Self {
            tokens,
            cookie_name: Arc::from(cookie_name),
        }
    }

    /// Resolve the bearer token carried by the request
    ///
    /// The Authorization header wins when present; the cookie is only
    /// consulted when there is no header at all.
    pub fn extract_token(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
            return value
                .strip_prefix("Bearer ")
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .ok_or(AuthError::InvalidToken);
        }

        extract_cookie(headers, &self.cookie_name)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)
    }

    /// Verify the request's token; never touches storage
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
        let token = self.extract_token(headers)?;
        let user_id = self.tokens.verify(&token)?;
        Ok(AuthenticatedUser { user_id })
    }
}

/// Middleware that rejects unauthenticated requests and binds the caller's
/// identity into the request extensions for downstream handlers
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();

    let user = gate.authenticate(request.headers()).map_err(|e| {
        warn!("Rejected request to protected endpoint {}: {}", endpoint, e);
        e
    })?;

    debug!("Authenticated user_id={} for endpoint={}", user.user_id, endpoint);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor for the identity bound by `require_auth`
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .copied()
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderName, HeaderValue, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use axum_test::TestServer;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn gate() -> AuthGate {
        AuthGate::new(Arc::new(TokenService::new(SECRET)), "access-token")
    }

    async fn whoami(user: AuthenticatedUser) -> String {
        user.user_id.to_string()
    }

    fn server() -> TestServer {
        let gate = gate();
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(gate, require_auth));
        TestServer::new(app).unwrap()
    }

    fn headers_with(name: HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_missing_carrier_is_missing_token() {
        assert!(matches!(
            gate().authenticate(&HeaderMap::new()),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_bearer_header_is_verified() {
        let gate = gate();
        let token = gate.tokens.issue(42).unwrap();
        let headers = headers_with(header::AUTHORIZATION, &format!("Bearer {}", token));
        assert_eq!(gate.authenticate(&headers).unwrap(), AuthenticatedUser { user_id: 42 });
    }

    #[test]
    fn test_cookie_carrier_is_verified() {
        let gate = gate();
        let token = gate.tokens.issue(9).unwrap();
        let headers = headers_with(header::COOKIE, &format!("access-token={}", token));
        assert_eq!(gate.authenticate(&headers).unwrap().user_id, 9);
    }

    #[test]
    fn test_invalid_bearer_format() {
        let gate = gate();
        for value in ["InvalidFormat token", "token_without_bearer", "Basic dXNlcjpwYXNz", "Bearer "] {
            let headers = headers_with(header::AUTHORIZATION, value);
            assert!(matches!(gate.authenticate(&headers), Err(AuthError::InvalidToken)));
        }
    }

    #[test]
    fn test_token_from_other_secret_is_invalid() {
        let foreign = TokenService::new("another-secret").issue(1).unwrap();
        let headers = headers_with(header::AUTHORIZATION, &format!("Bearer {}", foreign));
        assert!(matches!(gate().authenticate(&headers), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_extractor_without_gate_is_rejected() {
        let (mut parts, _) = axum::http::Request::builder().uri("/").body(()).unwrap().into_parts();
        let result = tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(AuthenticatedUser::from_request_parts(&mut parts, &()));
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn test_gate_binds_identity_for_handler() {
        let server = server();
        let token = gate().tokens.issue(77).unwrap();

        let response = server
            .get("/whoami")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "77");
    }

    #[tokio::test]
    async fn test_gate_rejects_missing_and_invalid_tokens() {
        let server = server();

        let missing = server.get("/whoami").await;
        assert_eq!(missing.status_code(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = missing.json();
        assert_eq!(body["error_code"], "UNAUTHENTICATED");
        assert_eq!(body["message"], "Missing authentication token");
        assert!(body["timestamp"].is_string());

        let invalid = server
            .get("/whoami")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer nonsense"))
            .await;
        assert_eq!(invalid.status_code(), StatusCode::UNAUTHORIZED);
    }
}
