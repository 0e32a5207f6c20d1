//! Token configuration loaded from the environment.
//!
//! | variable | default |
//! |---|---|
//! | `JWT_SECRET_KEY` | required outside development |
//! | `JWT_ALGORITHM` | `HS256` |
//! | `JWT_ACCESS_TOKEN_EXPIRES` | `1h` |
//! | `JWT_REFRESH_TOKEN_EXPIRES` | `1d` |
//! | `EPICRM_ENV` | `production` |

use chrono::Duration;
use jsonwebtoken::Algorithm;

use crate::error::AuthError;

pub const ENV_SECRET_KEY: &str = "JWT_SECRET_KEY";
pub const ENV_ALGORITHM: &str = "JWT_ALGORITHM";
pub const ENV_ACCESS_EXPIRES: &str = "JWT_ACCESS_TOKEN_EXPIRES";
pub const ENV_REFRESH_EXPIRES: &str = "JWT_REFRESH_TOKEN_EXPIRES";
pub const ENV_ENVIRONMENT: &str = "EPICRM_ENV";

/// Secret used when development mode runs without `JWT_SECRET_KEY`.
const DEV_SECRET: &str = "dev-secret";

/// Values that must never sign tokens outside development.
const PLACEHOLDER_SECRETS: &[&str] =
    &["dev-secret", "change-me", "changeme", "secret", "jwt-secret"];

/// Deployment context; only development tolerates placeholder secrets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    fn parse(value: &str) -> Result<Self, AuthError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(AuthError::configuration(format!(
                "{ENV_ENVIRONMENT} must be 'development' or 'production', got '{other}'"
            ))),
        }
    }
}

/// Signing key, algorithm and token lifetimes.
#[derive(Clone)]
pub struct AuthConfig {
    secret_key: String,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub environment: Environment,
}

impl AuthConfig {
    /// Production config with default lifetimes (1h access, 1d refresh).
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: Algorithm::HS256,
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(1),
            environment: Environment::Production,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup(ENV_ENVIRONMENT) {
            Some(value) => Environment::parse(&value)?,
            None => Environment::Production,
        };

        let secret_key = match lookup(ENV_SECRET_KEY).filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if environment == Environment::Development => {
                tracing::warn!("{ENV_SECRET_KEY} not set; using insecure development secret");
                DEV_SECRET.to_string()
            }
            None => {
                return Err(AuthError::configuration(format!("{ENV_SECRET_KEY} is not set")));
            }
        };

        let algorithm = match lookup(ENV_ALGORITHM) {
            Some(value) => parse_algorithm(&value)?,
            None => Algorithm::HS256,
        };

        let access_ttl = match lookup(ENV_ACCESS_EXPIRES) {
            Some(value) => parse_duration(&value)?,
            None => Duration::hours(1),
        };

        let refresh_ttl = match lookup(ENV_REFRESH_EXPIRES) {
            Some(value) => parse_duration(&value)?,
            None => Duration::days(1),
        };

        let config = Self {
            secret_key,
            algorithm,
            access_ttl,
            refresh_ttl,
            environment,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn secret_key(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    /// Refuse to sign with an empty or placeholder key outside development.
    pub fn validate(&self) -> Result<(), AuthError> {
        let secret = self.secret_key.trim();
        if secret.is_empty() {
            return Err(AuthError::configuration(format!("{ENV_SECRET_KEY} is empty")));
        }

        let placeholder = PLACEHOLDER_SECRETS
            .iter()
            .any(|p| p.eq_ignore_ascii_case(secret));
        if placeholder {
            if self.environment != Environment::Development {
                return Err(AuthError::configuration(format!(
                    "{ENV_SECRET_KEY} is a placeholder value"
                )));
            }
            tracing::warn!("signing tokens with a placeholder secret (development only)");
        } else if secret.len() < 32 {
            tracing::warn!("{ENV_SECRET_KEY} is shorter than recommended (32 bytes)");
        }

        if !matches!(self.algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::configuration(format!(
                "unsupported signing algorithm {:?}",
                self.algorithm
            )));
        }
        Ok(())
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("environment", &self.environment)
            .finish()
    }
}

/// Parse `<int>m`, `<int>h` or `<int>d` into a positive duration.
pub fn parse_duration(value: &str) -> Result<Duration, AuthError> {
    let value = value.trim();
    let invalid = || {
        AuthError::configuration(format!(
            "invalid duration '{value}' (expected an integer followed by m, h or d)"
        ))
    };

    let Some(unit) = value.chars().last() else {
        return Err(invalid());
    };
    let amount: i64 = value[..value.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }

    let duration = match unit {
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => return Err(invalid()),
    };
    duration.ok_or_else(invalid)
}

/// Only HMAC algorithms make sense with a shared secret key.
pub fn parse_algorithm(value: &str) -> Result<Algorithm, AuthError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(AuthError::configuration(format!(
            "unsupported {ENV_ALGORITHM} '{other}' (expected HS256, HS384 or HS512)"
        ))),
    }
}
