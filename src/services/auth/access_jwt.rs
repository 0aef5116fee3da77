use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::api::v1::extractors::Principal;

// Errors returned by access-token verification.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token secret is not configured")]
    MissingSecret,
}

/// Access token (JWT) claims.
///
/// NOTE:
/// - `sub` is kept as-is, an empty subject is rejected later by the identity service,
///   not here.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default)]
    pub sub: String,
    pub exp: u64,
}

/// HS256 access-token verifier keyed by the shared token secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: &str, leeway_seconds: u64) -> Result<Self, AccessJwtError> {
        if secret.is_empty() {
            return Err(AccessJwtError::MissingSecret);
        }

        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_nbf = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify, then convert claims into the principal handed to handlers.
    ///
    /// This is the entry-point for middleware.
    pub fn verify_principal(&self, token: &str) -> Result<Principal, AccessJwtError> {
        let claims = self.verify(token)?;
        Ok(Principal::new(claims.sub))
    }
}
