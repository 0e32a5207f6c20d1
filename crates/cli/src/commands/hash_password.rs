use std::io::{BufRead, Write};

use epicrm_auth::{Argon2Verifier, CredentialVerifier};

use super::read_line;

/// Hash the first line of stdin with the default Argon2 parameters.
pub fn hash_password(input: &mut impl BufRead, out: &mut impl Write) -> anyhow::Result<()> {
    let secret = read_line(input, None)?;
    let hash = Argon2Verifier::default().hash(&secret)?;
    writeln!(out, "{hash}")?;
    Ok(())
}
