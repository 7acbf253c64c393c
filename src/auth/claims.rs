/// JWT Claims structure
///
/// Payload of an access token: the user's email as subject plus the
/// standard time claims (RFC 7519).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user email). Optional on the way in so a token without
    /// one is reported as such instead of as a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// Claims for `identity`, issued at `now` and expiring `ttl` later.
    /// `None` when the expiry falls outside the representable date range.
    pub fn new(identity: &str, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let exp = now.checked_add_signed(ttl)?;
        Some(Self {
            sub: Some(identity.to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }

    /// Expired once `now` reaches `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Non-empty subject, if any
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.is_empty())
    }
}
