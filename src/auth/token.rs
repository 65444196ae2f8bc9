// JWT access token issuance and verification

use crate::auth::error::AuthError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default access token lifetime: 2 hours
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 7200;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // user_id
    pub iat: i64, // issued at timestamp
    pub exp: i64, // expiration timestamp
}

/// Token service for JWT operations
///
/// Holds the process-wide signing secret. The secret is never exposed or
/// logged; `Debug` is implemented by hand for that reason.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_duration: i64, // in seconds
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_token_duration", &self.access_token_duration)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a new TokenService with the default 2 hour lifetime
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, DEFAULT_ACCESS_TOKEN_TTL_SECS)
    }

    pub fn with_ttl(secret: &str, access_token_duration: i64) -> Self {
        // Expiry is compared by hand against an explicit clock, but the
        // claim itself must always be present.
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_duration,
        }
    }

    pub fn access_token_duration(&self) -> i64 {
        self.access_token_duration
    }

    /// Issue an access token for the user
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now().timestamp())
    }

    pub(crate) fn issue_at(&self, user_id: i64, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + self.access_token_duration,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Verify an access token and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<i64, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub(crate) fn verify_at(&self, token: &str, now: i64) -> Result<i64, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?;

        if claims.exp <= now {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn test_token_service() -> TokenService {
        TokenService::new(SECRET)
    }

    #[test]
    fn test_issued_token_verifies_to_same_user() {
        let service = test_token_service();
        let token = service.issue(7).unwrap();
        assert_eq!(service.verify(&token).unwrap(), 7);
    }

    #[test]
    fn test_access_token_expiration_is_2_hours() {
        let service = test_token_service();
        let token = service.issue(1).unwrap();

        let mut validation = Validation::default();
        validation.validate_exp = false;
        let claims = decode::<Claims>(&token, &DecodingKey::from_secret(SECRET.as_bytes()), &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn test_token_rejected_once_expiry_has_passed() {
        let service = test_token_service();
        let now = Utc::now().timestamp();
        let token = service.issue_at(7, now).unwrap();

        assert_eq!(service.verify_at(&token, now + 7199).unwrap(), 7);
        assert!(matches!(
            service.verify_at(&token, now + 7200),
            Err(AuthError::ExpiredToken)
        ));
        assert!(matches!(
            service.verify_at(&token, now + 10_000),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn test_token_issued_in_the_past_is_expired() {
        let service = TokenService::with_ttl(SECRET, 60);
        let token = service.issue_at(3, Utc::now().timestamp() - 120).unwrap();
        assert!(matches!(service.verify(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn test_missing_expiry_claim_is_rejected() {
        #[derive(Serialize)]
        struct NoExpiry {
            sub: i64,
            iat: i64,
        }

        let token = encode(
            &Header::default(),
            &NoExpiry { sub: 7, iat: Utc::now().timestamp() },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(test_token_service().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_missing_subject_claim_is_rejected() {
        #[derive(Serialize)]
        struct NoSubject {
            iat: i64,
            exp: i64,
        }

        let now = Utc::now().timestamp();
        let token = encode(
            &Header::default(),
            &NoSubject { iat: now, exp: now + 600 },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(test_token_service().verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let service = test_token_service();
        let victim = service.issue(7).unwrap();
        let other = service.issue(8).unwrap();

        let victim_parts: Vec<&str> = victim.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", victim_parts[0], other_parts[1], victim_parts[2]);

        assert!(matches!(service.verify(&forged), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_token_signature_verification() {
        let service1 = TokenService::new("secret1");
        let service2 = TokenService::new("secret2");

        let token = service1.issue(1).unwrap();

        assert!(service1.verify(&token).is_ok());
        assert!(matches!(service2.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = test_token_service();

        assert!(service.verify("").is_err());
        assert!(service.verify("not.a.token").is_err());
        assert!(service.verify("invalid_token_format").is_err());
        assert!(service
            .verify("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.invalid.signature")
            .is_err());
    }

    #[test]
    fn test_debug_output_hides_secret() {
        let rendered = format!("{:?}", TokenService::new("super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
    }

    proptest! {
        #[test]
        fn prop_token_round_trips_user_id(user_id in 1i64..i64::MAX / 2) {
            let service = test_token_service();
            let token = service.issue(user_id)?;
            prop_assert_eq!(service.verify(&token)?, user_id);
        }

        #[test]
        fn prop_malformed_tokens_rejected(malformed in "[a-zA-Z0-9._-]{0,80}") {
            let service = test_token_service();
            prop_assert!(service.verify(&malformed).is_err());
        }
    }
}
