use std::io::Write;

use epicrm_auth::SessionStore;

use crate::context::{AppContext, session_store};
use crate::settings::Settings;

/// Revoke whatever the session holds and delete it. Always succeeds: without
/// a usable auth core the session files are still removed, and without
/// settings there is nothing to remove.
pub fn logout(
    ctx: Option<&AppContext>,
    settings: Option<&Settings>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match (ctx, settings) {
        (Some(ctx), _) => ctx.service.logout(None, None),
        (None, Some(settings)) => {
            if let Err(err) = session_store(settings).clear() {
                tracing::warn!(error = %err, "could not clear session");
            }
        }
        (None, None) => {}
    }
    // Output is best effort too.
    let _ = writeln!(out, "logged out");
    Ok(())
}
