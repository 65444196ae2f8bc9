// Password hashing and verification service

use crate::auth::error::AuthError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Password service for hashing and verification (Argon2id)
#[derive(Clone, Default)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// Create a PasswordService with custom Argon2id cost parameters
    pub fn with_params(params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Hash a password into a PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }

    /// Verify a password against a stored hash
    ///
    /// A digest that cannot be parsed is an internal error; a mismatch is `Ok(false)`.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::PasswordHashError(e.to_string()))?;
        Ok(self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
pub(crate) fn fast_password_service() -> PasswordService {
    PasswordService::with_params(Params::new(8, 1, 1, None).expect("valid argon2 params"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let service = fast_password_service();
        let hash = service.hash_password("secret1").unwrap();

        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("secret1", &hash).unwrap());
        assert!(!service.verify_password("secret2", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let service = fast_password_service();
        let a = service.hash_password("secret1").unwrap();
        let b = service.hash_password("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_digest_is_an_error() {
        let service = fast_password_service();
        assert!(matches!(
            service.verify_password("secret1", "not-a-phc-string"),
            Err(AuthError::PasswordHashError(_))
        ));
    }

    #[test]
    fn test_default_params_verify_fast_hashes() {
        // The PHC string carries its own parameters
        let hash = fast_password_service().hash_password("secret1").unwrap();
        assert!(PasswordService::default().verify_password("secret1", &hash).unwrap());
    }
}
