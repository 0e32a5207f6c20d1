use std::io::{BufRead, Write};

use anyhow::Context;

use crate::cli::LoginArgs;
use crate::context::AppContext;

use super::read_line;

/// Authenticate and persist the token pair in the session directory.
pub fn login(
    ctx: &AppContext,
    args: &LoginArgs,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let username = match &args.username {
        Some(username) => username.clone(),
        None => read_line(input, Some("Username: "))?,
    };
    // Interactive entry goes through the terminal with echo disabled.
    let password = if args.password_stdin {
        read_line(input, None)?
    } else {
        rpassword::prompt_password("Password: ").context("cannot read password")?
    };

    let principal = {
        let pair = ctx.service.authenticate(username.trim(), &password)?;
        ctx.service.principal_for(&pair.access_token)?
    };
    writeln!(out, "logged in as user {}", principal.id)?;
    Ok(())
}
