//! Filesystem locations used by the CLI.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::cli::Cli;

const HOME_DIR_NAME: &str = ".epicrm";
const LEDGER_FILE: &str = "revocation_ledger.json";
const SESSION_DIR: &str = "session";
const USERS_FILE: &str = "users.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    pub users: PathBuf,
    pub role_rules: Option<PathBuf>,
}

impl Settings {
    /// Resolve paths from flags/env, falling back to `~/.epicrm`.
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        let home = match &cli.home {
            Some(home) => home.clone(),
            None => dirs::home_dir()
                .context("cannot determine the home directory; set EPICRM_HOME")?
                .join(HOME_DIR_NAME),
        };
        Ok(Self::under(home, cli.users.clone(), cli.role_rules.clone()))
    }

    pub fn under(home: PathBuf, users: Option<PathBuf>, role_rules: Option<PathBuf>) -> Self {
        let users = users.unwrap_or_else(|| home.join(USERS_FILE));
        Self {
            home,
            users,
            role_rules,
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.home.join(LEDGER_FILE)
    }

    pub fn session_dir(&self) -> PathBuf {
        self.home.join(SESSION_DIR)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}
