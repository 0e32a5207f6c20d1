use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use epicrm_core::UserId;

use crate::error::AuthError;

/// Tolerated clock skew for `iat` values slightly ahead of the local clock.
const MAX_ISSUED_AT_SKEW_SECS: i64 = 60;

/// Kind of issued credential.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "access_token")]
    Access,
    #[serde(rename = "refresh_token")]
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access_token",
            TokenType::Refresh => "refresh_token",
        }
    }
}

impl core::fmt::Display for TokenType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed claims set carried by every token.
///
/// `sub` is the string-encoded user id; `iat`/`exp` are unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Empty when absent from the wire; such tokens never pass verification.
    #[serde(default)]
    pub jti: String,
}

impl Claims {
    /// Build a fresh claims set with a random 128-bit jti.
    pub fn new(subject: UserId, token_type: TokenType, now: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = now.timestamp();
        Self {
            sub: subject.to_string(),
            iat,
            exp: iat.saturating_add(ttl.num_seconds()),
            token_type,
            jti: Uuid::new_v4().simple().to_string(),
        }
    }

    pub fn subject_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::Malformed)
    }

    /// Reject tokens minted in the future (beyond a small skew allowance).
    ///
    /// Signature and `exp` are checked by the codec; this only covers what the
    /// signature library leaves alone.
    pub fn check_issued_at(&self, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.iat > now.timestamp().saturating_add(MAX_ISSUED_AT_SKEW_SECS) {
            return Err(AuthError::Malformed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_claims_span_the_ttl() {
        let now = Utc::now();
        let claims = Claims::new(UserId::new(7), TokenType::Access, now, Duration::hours(2));

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.exp - claims.iat, 7200);
        assert_eq!(claims.jti.len(), 32);
        assert_eq!(claims.subject_id().unwrap(), UserId::new(7));
    }

    #[test]
    fn jtis_are_unique_per_issuance() {
        let now = Utc::now();
        let a = Claims::new(UserId::new(1), TokenType::Refresh, now, Duration::days(1));
        let b = Claims::new(UserId::new(1), TokenType::Refresh, now, Duration::days(1));
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn type_claim_uses_wire_names() {
        let claims = Claims::new(UserId::new(3), TokenType::Refresh, Utc::now(), Duration::days(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh_token");
        assert_eq!(json["sub"], "3");
    }

    #[test]
    fn future_issued_at_is_malformed() {
        let now = Utc::now();
        let issued = now + Duration::hours(1);
        let claims = Claims::new(UserId::new(1), TokenType::Access, issued, Duration::hours(1));
        assert!(matches!(claims.check_issued_at(now), Err(AuthError::Malformed)));
        assert!(claims.check_issued_at(now + Duration::hours(1)).is_ok());
    }

    #[test]
    fn non_numeric_subject_is_malformed() {
        let mut claims =
            Claims::new(UserId::new(1), TokenType::Access, Utc::now(), Duration::hours(1));
        claims.sub = "alice".to_string();
        assert!(matches!(claims.subject_id(), Err(AuthError::Malformed)));
    }
}
