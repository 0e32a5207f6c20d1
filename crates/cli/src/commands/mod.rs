//! Command implementations.
//!
//! - `login`: authenticate and store a token pair
//! - `logout`: revoke and forget the stored tokens
//! - `refresh`: rotate the stored refresh token
//! - `whoami`: show the current principal
//! - `check`: evaluate one authorization query
//! - `hash-password`: print an Argon2 hash for the user directory

mod check;
mod hash_password;
mod login;
mod logout;
mod refresh;
mod whoami;

pub use check::check;
pub use hash_password::hash_password;
pub use login::login;
pub use logout::logout;
pub use refresh::refresh;
pub use whoami::whoami;

use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::Context;

use epicrm_auth::AuthError;

use crate::cli::{Cli, Commands};
use crate::context::AppContext;
use crate::settings::Settings;

/// Exit status for a refused request (bad credentials, stale session,
/// denied permission).
pub const EXIT_REFUSED: u8 = 1;
/// Exit status for configuration and storage failures.
pub const EXIT_FAILURE: u8 = 2;

/// Run the selected command against stdin/stdout and map the outcome to an
/// exit status.
pub fn execute(cli: &Cli) -> ExitCode {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();

    match dispatch(cli, &mut input, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let (code, message) = classify(&err);
            eprintln!("error: {message}");
            ExitCode::from(code)
        }
    }
}

fn dispatch(cli: &Cli, input: &mut impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    let context = || Settings::resolve(cli).and_then(|settings| AppContext::build(&settings));
    match &cli.command {
        Commands::Login(args) => login(&context()?, args, input, out),
        Commands::Logout => logout_best_effort(Settings::resolve(cli), out),
        Commands::Refresh => refresh(&context()?, out),
        Commands::Whoami(args) => whoami(&context()?, args, out),
        Commands::Check(args) => check(&context()?, args, out),
        Commands::HashPassword => hash_password(input, out),
    }
}

/// Logout degrades instead of failing: without settings nothing is cleared,
/// without an auth core the session files are removed but not revoked.
fn logout_best_effort(
    settings: anyhow::Result<Settings>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let settings = settings
        .inspect_err(|e| tracing::warn!(error = %format!("{e:#}"), "no session location"))
        .ok();
    let ctx = settings.as_ref().and_then(|settings| {
        AppContext::build(settings)
            .inspect_err(|e| {
                tracing::warn!(error = %format!("{e:#}"), "logging out without revocation")
            })
            .ok()
    });
    logout(ctx.as_ref(), settings.as_ref(), out)
}

/// Refusals print the core's user-facing message; everything else prints
/// the full error chain.
pub fn classify(err: &anyhow::Error) -> (u8, String) {
    match err.downcast_ref::<AuthError>() {
        Some(auth)
            if auth.is_unauthenticated()
                || matches!(auth, AuthError::PermissionDenied | AuthError::InvalidSecret) =>
        {
            (EXIT_REFUSED, auth.user_message().to_string())
        }
        Some(auth) => {
            tracing::error!(error = %auth, "command failed");
            (EXIT_FAILURE, format!("{}: {err:#}", auth.user_message()))
        }
        None => (EXIT_FAILURE, format!("{err:#}")),
    }
}

/// Read one line, optionally prompting on stderr. The line terminator is
/// stripped; other whitespace is kept.
pub(crate) fn read_line(input: &mut impl BufRead, prompt: Option<&str>) -> anyhow::Result<String> {
    if let Some(prompt) = prompt {
        eprint!("{prompt}");
        std::io::stderr().flush().context("cannot write prompt")?;
    }
    let mut line = String::new();
    input.read_line(&mut line).context("cannot read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
