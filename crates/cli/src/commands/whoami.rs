use std::io::Write;

use crate::cli::WhoamiArgs;
use crate::context::AppContext;

pub fn whoami(ctx: &AppContext, args: &WhoamiArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let principal = ctx.service.current_principal()?;

    if args.json {
        serde_json::to_writer(&mut *out, &principal)?;
        writeln!(out)?;
        return Ok(());
    }

    let roles: Vec<&str> = principal.roles.iter().map(|r| r.as_str()).collect();
    writeln!(out, "user {}", principal.id)?;
    if roles.is_empty() {
        writeln!(out, "roles: (none)")?;
    } else {
        writeln!(out, "roles: {}", roles.join(", "))?;
    }
    if ctx.engine.is_admin(&principal) {
        writeln!(out, "administrator")?;
    }
    Ok(())
}
