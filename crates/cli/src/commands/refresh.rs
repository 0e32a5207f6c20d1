use std::io::Write;

use crate::context::AppContext;

/// Rotate the stored refresh token.
pub fn refresh(ctx: &AppContext, out: &mut impl Write) -> anyhow::Result<()> {
    ctx.service.refresh_from_session()?;
    writeln!(out, "session refreshed")?;
    Ok(())
}
