//! Login, verification, refresh rotation and logout.

use std::sync::Arc;

use chrono::Duration;

use epicrm_core::UserId;

use crate::claims::{Claims, TokenType};
use crate::codec::TokenCodec;
use crate::config::AuthConfig;
use crate::credentials::CredentialVerifier;
use crate::directory::UserDirectory;
use crate::error::{AuthError, AuthResult, LedgerError};
use crate::ledger::RevocationLedger;
use crate::principal::Principal;
use crate::session::{SessionStore, TokenPair};

/// Hashed when the service is built and verified against when a username is
/// unknown, so both failure causes cost exactly one `verify`.
const DECOY_SECRET: &str = "epicrm-decoy-credential";

/// Orchestrates the token lifecycle over injected collaborators.
pub struct TokenService {
    codec: TokenCodec,
    ledger: Arc<dyn RevocationLedger>,
    verifier: Arc<dyn CredentialVerifier>,
    directory: Arc<dyn UserDirectory>,
    session: Arc<dyn SessionStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    decoy_hash: String,
}

impl core::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenService")
            .field("codec", &self.codec)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(
        config: &AuthConfig,
        ledger: Arc<dyn RevocationLedger>,
        verifier: Arc<dyn CredentialVerifier>,
        directory: Arc<dyn UserDirectory>,
        session: Arc<dyn SessionStore>,
    ) -> AuthResult<Self> {
        let codec = TokenCodec::new(config)?;
        let decoy_hash = verifier.hash(DECOY_SECRET)?;
        Ok(Self {
            codec,
            ledger,
            verifier,
            directory,
            session,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            decoy_hash,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn ledger(&self) -> &dyn RevocationLedger {
        self.ledger.as_ref()
    }

    /// Exchange credentials for a fresh token pair.
    ///
    /// Unknown user and wrong password both fail with `InvalidCredentials`.
    /// Both jtis are in the ledger and the pair is in the session store when
    /// this returns.
    pub fn authenticate(&self, username: &str, password: &str) -> AuthResult<TokenPair> {
        let account = self.directory.find_by_username(username)?;

        let matched = match &account {
            Some(account) => self.verifier.verify(&account.password_hash, password),
            None => {
                // Result ignored; the call only equalizes cost.
                let _ = self.verifier.verify(&self.decoy_hash, password);
                false
            }
        };
        let Some(account) = account.filter(|_| matched) else {
            tracing::warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let pair = self.issue_pair(account.id)?;
        self.session.save(&pair)?;
        tracing::info!(user = %account.id, "login succeeded");
        Ok(pair)
    }

    /// The single choke point for presented tokens.
    ///
    /// Signature and expiry come first, then ledger membership, then the
    /// optional token kind.
    pub fn verify(&self, token: &str, require: Option<TokenType>) -> AuthResult<Claims> {
        let claims = self.codec.decode(token).inspect_err(|e| match e {
            AuthError::Expired => tracing::debug!("token expired"),
            other => tracing::warn!(error = %other, "rejected undecodable token"),
        })?;

        if claims.jti.is_empty() || !self.ledger_check(|l| l.is_valid(&claims.jti))? {
            tracing::info!(sub = %claims.sub, "token not in ledger");
            return Err(AuthError::Revoked);
        }

        match require {
            Some(expected) if claims.token_type != expected => Err(AuthError::WrongTokenType {
                expected,
                found: claims.token_type,
            }),
            _ => Ok(claims),
        }
    }

    /// Rotate a refresh token: the presented one is consumed and a new pair
    /// is issued.
    ///
    /// Of concurrent calls presenting the same token exactly one succeeds;
    /// the rest, and any later reuse, fail with `Revoked`.
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.verify(refresh_token, Some(TokenType::Refresh))?;
        let subject = claims.subject_id()?;

        if !self.ledger_check(|l| l.take(&claims.jti))? {
            tracing::warn!(
                user = %subject,
                jti = %claims.jti,
                "refresh token replayed after rotation"
            );
            return Err(AuthError::Revoked);
        }

        if self.directory.find_by_id(subject)?.is_none() {
            tracing::warn!(user = %subject, "refresh for unknown account");
            return Err(AuthError::Revoked);
        }

        let pair = self.issue_pair(subject)?;
        self.session.save(&pair)?;
        tracing::info!(user = %subject, "token pair rotated");
        Ok(pair)
    }

    /// Refresh using the refresh token held by the session store.
    pub fn refresh_from_session(&self) -> AuthResult<TokenPair> {
        let token = self
            .session
            .refresh_token()?
            .ok_or(AuthError::NotAuthenticated)?;
        self.refresh(&token)
    }

    /// Best-effort revocation of the given tokens plus whatever the session
    /// store holds. Never fails; the session is always cleared.
    pub fn logout(&self, access_token: Option<&str>, refresh_token: Option<&str>) {
        let mut tokens: Vec<String> = [access_token, refresh_token]
            .into_iter()
            .flatten()
            .map(str::to_owned)
            .collect();
        match (self.session.access_token(), self.session.refresh_token()) {
            (Ok(access), Ok(refresh)) => tokens.extend(access.into_iter().chain(refresh)),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "could not read session tokens")
            }
        }

        let mut revoked = 0usize;
        for token in &tokens {
            let Ok(claims) = self.codec.decode_allow_expired(token) else {
                tracing::debug!("skipping undecodable token on logout");
                continue;
            };
            if claims.jti.is_empty() {
                continue;
            }
            match self.ledger.revoke(&claims.jti) {
                Ok(()) => revoked += 1,
                Err(e) => tracing::warn!(error = %e, "revocation failed during logout"),
            }
        }

        if let Err(e) = self.session.clear() {
            tracing::warn!(error = %e, "could not clear session");
        }
        tracing::info!(revoked, "logged out");
    }

    /// Resolve the caller from the access token in the session store.
    pub fn current_principal(&self) -> AuthResult<Principal> {
        let token = self
            .session
            .access_token()?
            .ok_or(AuthError::NotAuthenticated)?;
        self.principal_for(&token)
    }

    /// Verify an access token and load the roles of its subject.
    pub fn principal_for(&self, access_token: &str) -> AuthResult<Principal> {
        let claims = self.verify(access_token, Some(TokenType::Access))?;
        let id = claims.subject_id()?;
        let account = self
            .directory
            .find_by_id(id)?
            .ok_or(AuthError::NotAuthenticated)?;
        Ok(account.principal())
    }

    fn issue_pair(&self, subject: UserId) -> AuthResult<TokenPair> {
        let access = self.codec.issue(subject, TokenType::Access, self.access_ttl)?;
        let refresh = self.codec.issue(subject, TokenType::Refresh, self.refresh_ttl)?;
        self.ledger_check(|l| l.add_many(&[access.jti.as_str(), refresh.jti.as_str()]))?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    fn ledger_check<T>(
        &self,
        op: impl FnOnce(&dyn RevocationLedger) -> Result<T, LedgerError>,
    ) -> AuthResult<T> {
        op(self.ledger.as_ref()).map_err(|e| {
            tracing::error!(error = %e, "revocation ledger unavailable");
            AuthError::Ledger(e)
        })
    }

}
