//! Signing and decoding of claims sets.
//!
//! The codec is pure: it checks signature and expiry only and never touches
//! the revocation ledger.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use epicrm_core::UserId;

use crate::claims::{Claims, TokenType};
use crate::config::AuthConfig;
use crate::error::AuthError;

/// A freshly signed token and the jti it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub jti: String,
}

/// Encodes/decodes signed tokens with a process-wide key.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Fails with `Configuration` on an unset or placeholder key (outside
    /// development) or a non-HMAC algorithm.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        config.validate()?;

        let mut validation = Validation::new(config.algorithm);
        // Expiry is exact: a token one second past `exp` is expired.
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm: config.algorithm,
            encoding_key: EncodingKey::from_secret(config.secret_key()),
            decoding_key: DecodingKey::from_secret(config.secret_key()),
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign a new `{sub, iat, exp, type, jti}` claims set.
    ///
    /// A negative `ttl` yields an already-expired token.
    pub fn issue(
        &self,
        subject: UserId,
        token_type: TokenType,
        ttl: Duration,
    ) -> Result<IssuedToken, AuthError> {
        let claims = Claims::new(subject, token_type, Utc::now(), ttl);
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::configuration(format!("token signing failed: {e}")))?;

        Ok(IssuedToken {
            token,
            jti: claims.jti,
        })
    }

    /// Verify signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        self.decode_with(token, &self.validation)
    }

    /// Verify the signature but accept expired tokens.
    ///
    /// Used to revoke whatever a logout presents; the signature check keeps
    /// forged tokens from naming arbitrary jtis.
    pub fn decode_allow_expired(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;
        self.decode_with(token, &validation)
    }

    fn decode_with(&self, token: &str, validation: &Validation) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token.trim(), &self.decoding_key, validation)
            .map_err(map_decode_error)?;
        data.claims.check_issued_at(Utc::now())?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        _ => AuthError::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "codec-test-secret-0123456789abcdef";

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new(SECRET)).unwrap()
    }

    #[test]
    fn issue_then_decode() {
        let codec = codec();
        let issued = codec
            .issue(UserId::new(7), TokenType::Access, Duration::hours(1))
            .unwrap();

        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.subject_id().unwrap(), UserId::new(7));
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn already_expired_token_is_expired() {
        let codec = codec();
        let issued = codec
            .issue(UserId::new(7), TokenType::Access, Duration::seconds(-1))
            .unwrap();

        assert!(matches!(codec.decode(&issued.token), Err(AuthError::Expired)));

        let claims = codec.decode_allow_expired(&issued.token).unwrap();
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn foreign_key_is_invalid_signature() {
        let other = TokenCodec::new(&AuthConfig::new("another-secret-0123456789abcdefgh")).unwrap();
        let issued = other
            .issue(UserId::new(1), TokenType::Refresh, Duration::days(1))
            .unwrap();

        assert!(matches!(codec().decode(&issued.token), Err(AuthError::InvalidSignature)));
        assert!(matches!(
            codec().decode_allow_expired(&issued.token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_payload_is_invalid_signature() {
        let codec = codec();
        let issued = codec
            .issue(UserId::new(7), TokenType::Access, Duration::hours(1))
            .unwrap();
        let forged = codec
            .issue(UserId::new(1), TokenType::Access, Duration::hours(1))
            .unwrap();

        // Splice the forged payload onto the original signature.
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_parts: Vec<&str> = forged.token.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(codec.decode(&spliced), Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn other_algorithm_is_invalid_signature() {
        let config = AuthConfig::new(SECRET).with_algorithm(Algorithm::HS512);
        let hs512 = TokenCodec::new(&config).unwrap();
        let issued = hs512
            .issue(UserId::new(2), TokenType::Access, Duration::hours(1))
            .unwrap();

        assert!(matches!(codec().decode(&issued.token), Err(AuthError::InvalidSignature)));
        assert_eq!(hs512.decode(&issued.token).unwrap().sub, "2");
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec();
        assert!(matches!(codec.decode(""), Err(AuthError::Malformed)));
        assert!(matches!(codec.decode("not-a-token"), Err(AuthError::Malformed)));
        assert!(matches!(codec.decode("a.b.c"), Err(AuthError::Malformed)));
    }

    #[test]
    fn placeholder_secret_refuses_to_build() {
        let err = TokenCodec::new(&AuthConfig::new("secret")).unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }
}
