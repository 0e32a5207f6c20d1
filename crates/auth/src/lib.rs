//! `epicrm-auth`: authentication and authorization core.
//!
//! Credentials are checked by a [`CredentialVerifier`], tokens are signed by a
//! [`TokenCodec`] and honored only while their jti sits in a
//! [`RevocationLedger`]. [`TokenService`] ties these together; the
//! [`PermissionEngine`] answers "may this principal do that" from static role
//! rules plus ownership facts supplied by the caller.
//!
//! The crate knows nothing about HTTP or the records database.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod service;
pub mod session;
pub mod user;

pub use authorize::{AuthorizationQuery, Decision, GrantPath, PermissionEngine, USER_RESOURCE};
pub use claims::{Claims, TokenType};
pub use codec::{IssuedToken, TokenCodec};
pub use config::{AuthConfig, Environment};
pub use credentials::{Argon2Verifier, CredentialVerifier, HashParams};
pub use directory::{InMemoryDirectory, JsonFileDirectory, UserDirectory};
pub use error::{AuthError, AuthResult, LedgerError};
pub use ledger::{FileLedger, InMemoryLedger, RevocationLedger};
pub use permissions::Operation;
pub use principal::Principal;
pub use roles::{ADMIN_ROLE, Role, RoleRules, RuleSet, WILDCARD_RESOURCE};
pub use service::TokenService;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, TokenPair};
pub use user::{USER_ROLE_RESOURCE, UserAccount};
