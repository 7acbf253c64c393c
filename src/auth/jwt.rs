/// JWT Token Generation and Validation
///
/// `TokenService` is built once at startup from `JwtSettings` and shared
/// read-only by every worker. Time is always passed in by the caller, so
/// expiry is decided against the caller's clock and not the library's.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::error::AppError;

/// Why a token was rejected. Logged, never shown to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    InvalidSignature,
    Expired,
    Malformed,
    MissingSubject,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "signature does not verify"),
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Malformed => write!(f, "token cannot be parsed"),
            TokenError::MissingSubject => write!(f, "token has no subject"),
        }
    }
}

impl std::error::Error for TokenError {}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl", &self.ttl)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenService {
    /// # Errors
    /// Returns a configuration error for an empty secret, a non-HMAC
    /// algorithm or a TTL outside 1 minute to 1 year.
    pub fn new(config: &JwtSettings) -> Result<Self, config::ConfigError> {
        config.validate()?;
        let algorithm = config.algorithm()?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm,
            ttl: Duration::minutes(config.access_token_expire_minutes),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token whose subject is `identity`, valid from `now` for one TTL.
    pub fn issue(&self, identity: &str, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = Claims::new(identity, now, self.ttl)
            .ok_or_else(|| AppError::Internal("Token expiry out of range".to_string()))?;

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Check signature, expiry and subject, returning the subject.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.decode_claims(token)?;

        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        claims
            .subject()
            .map(str::to_string)
            .ok_or(TokenError::MissingSubject)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked against the caller's `now`; `exp` presence is
        // enforced by `Claims` deserialization.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed,
            })
    }
}
