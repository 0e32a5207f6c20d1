//! Wiring of the auth core for one CLI invocation.

use std::sync::Arc;

use anyhow::Context as _;

use epicrm_auth::{
    Argon2Verifier, AuthConfig, FileLedger, FileSessionStore, JsonFileDirectory,
    PermissionEngine, RoleRules, TokenService,
};

use crate::settings::Settings;

/// Everything a command needs: the token service over file-backed stores and
/// the permission engine.
#[derive(Debug)]
pub struct AppContext {
    pub service: TokenService,
    pub engine: PermissionEngine,
}

impl AppContext {
    pub fn build(settings: &Settings) -> anyhow::Result<Self> {
        let config = AuthConfig::from_env().context("invalid token configuration")?;
        Self::with_config(settings, &config)
    }

    pub fn with_config(settings: &Settings, config: &AuthConfig) -> anyhow::Result<Self> {
        let ledger = FileLedger::open(settings.ledger_path())
            .context("revocation ledger unavailable")?;

        let service = TokenService::new(
            config,
            Arc::new(ledger),
            Arc::new(Argon2Verifier::default()),
            Arc::new(JsonFileDirectory::new(&settings.users)),
            Arc::new(session_store(settings)),
        )?;

        Ok(Self {
            service,
            engine: PermissionEngine::new(role_rules(settings)?),
        })
    }
}

pub fn session_store(settings: &Settings) -> FileSessionStore {
    FileSessionStore::new(settings.session_dir())
}

fn role_rules(settings: &Settings) -> anyhow::Result<RoleRules> {
    match &settings.role_rules {
        Some(path) => RoleRules::load(path)
            .with_context(|| format!("cannot load role rules from {}", path.display())),
        None => Ok(RoleRules::builtin()),
    }
}
