use std::io::Write;

use anyhow::Context;

use epicrm_auth::{AuthorizationQuery, Operation};
use epicrm_core::UserId;

use crate::cli::CheckArgs;
use crate::context::AppContext;

/// Evaluate one query for the logged-in user; a denial is an error.
pub fn check(ctx: &AppContext, args: &CheckArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let operation: Operation = args
        .operation
        .parse()
        .with_context(|| format!("unknown operation '{}'", args.operation))?;
    let principal = ctx.service.current_principal()?;

    let query = AuthorizationQuery::new(&principal, &args.resource, operation)
        .owned_by(args.owner.map(UserId::new))
        .targeting(args.target.map(UserId::new))
        .restrict_to_own(args.own_only);
    ctx.engine.ensure(&query)?;

    writeln!(out, "allowed")?;
    Ok(())
}
