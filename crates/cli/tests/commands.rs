use std::io::Cursor;
use std::path::Path;

use epicrm_auth::{
    Argon2Verifier, AuthConfig, AuthError, CredentialVerifier, FileLedger, HashParams,
    RevocationLedger,
};
use epicrm_cli::cli::{CheckArgs, LoginArgs, WhoamiArgs};
use epicrm_cli::commands::{self, EXIT_REFUSED};
use epicrm_cli::{AppContext, Settings};
use serde_json::json;

const SECRET: &str = "cli-test-signing-key-0123456789abcdef";

fn seed_users(path: &Path) {
    let verifier = Argon2Verifier::new(HashParams {
        time_cost: 1,
        memory_cost_kib: 64,
        parallelism: 1,
    })
    .unwrap();
    let users = json!([
        {
            "id": 1,
            "username": "root",
            "password_hash": verifier.hash("root-pass").unwrap(),
            "roles": ["admin"],
        },
        {
            "id": 7,
            "username": "sam",
            "password_hash": verifier.hash("sales-pass").unwrap(),
            "roles": ["sales"],
        },
    ]);
    std::fs::write(path, users.to_string()).unwrap();
}

fn setup() -> (tempfile::TempDir, Settings, AppContext) {
    let home = tempfile::tempdir().unwrap();
    let settings = Settings::under(home.path().to_path_buf(), None, None);
    seed_users(&settings.users);
    let ctx = AppContext::with_config(&settings, &AuthConfig::new(SECRET)).unwrap();
    (home, settings, ctx)
}

fn login(ctx: &AppContext, user: &str, password: &str) -> anyhow::Result<String> {
    let args = LoginArgs {
        username: Some(user.to_string()),
        password_stdin: true,
    };
    let mut input = Cursor::new(format!("{password}\n"));
    let mut out = Vec::new();
    commands::login(ctx, &args, &mut input, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn check(ctx: &AppContext, resource: &str, op: &str, owner: Option<u64>) -> anyhow::Result<()> {
    let args = CheckArgs {
        resource: resource.to_string(),
        operation: op.to_string(),
        owner,
        target: None,
        own_only: false,
    };
    commands::check(ctx, &args, &mut Vec::new())
}

fn whoami(ctx: &AppContext) -> anyhow::Result<String> {
    let mut out = Vec::new();
    commands::whoami(ctx, &WhoamiArgs::default(), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn login_whoami_check_logout() {
    let (_home, settings, ctx) = setup();

    assert_eq!(login(&ctx, "sam", "sales-pass").unwrap(), "logged in as user 7\n");
    assert_eq!(whoami(&ctx).unwrap(), "user 7\nroles: sales\n");

    check(&ctx, "client", "UPDATE", Some(7)).unwrap();
    let denied = check(&ctx, "client", "UPDATE", Some(8)).unwrap_err();
    assert_eq!(
        commands::classify(&denied),
        (EXIT_REFUSED, "access denied".to_string())
    );
    assert!(check(&ctx, "client", "delete", Some(7)).is_err());

    commands::logout(Some(&ctx), Some(&settings), &mut Vec::new()).unwrap();
    let err = whoami(&ctx).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AuthError>(),
        Some(AuthError::NotAuthenticated)
    ));
    assert!(FileLedger::open(settings.ledger_path()).unwrap().is_empty().unwrap());
}

#[test]
fn wrong_password_is_refused() {
    let (_home, _settings, ctx) = setup();
    let err = login(&ctx, "sam", "nope").unwrap_err();
    assert_eq!(
        commands::classify(&err),
        (EXIT_REFUSED, "invalid credentials".to_string())
    );
}

#[test]
fn refresh_rotates_stored_session() {
    let (_home, settings, ctx) = setup();
    login(&ctx, "root", "root-pass").unwrap();

    let before = std::fs::read_to_string(settings.session_dir().join("refresh_token")).unwrap();
    commands::refresh(&ctx, &mut Vec::new()).unwrap();
    let after = std::fs::read_to_string(settings.session_dir().join("refresh_token")).unwrap();
    assert_ne!(before, after);

    let out = whoami(&ctx).unwrap();
    assert!(out.contains("administrator"));
}

#[test]
fn refresh_without_session_asks_for_login() {
    let (_home, _settings, ctx) = setup();
    let err = commands::refresh(&ctx, &mut Vec::new()).unwrap_err();
    assert_eq!(
        commands::classify(&err),
        (EXIT_REFUSED, "not logged in, please log in".to_string())
    );
}

#[test]
fn logout_without_core_still_clears_session() {
    let (_home, settings, ctx) = setup();
    login(&ctx, "sam", "sales-pass").unwrap();
    assert!(settings.session_dir().join("access_token").exists());

    commands::logout(None, Some(&settings), &mut Vec::new()).unwrap();
    assert!(!settings.session_dir().join("access_token").exists());
    assert!(!settings.session_dir().join("refresh_token").exists());
}

#[test]
fn corrupt_ledger_blocks_startup() {
    let home = tempfile::tempdir().unwrap();
    let settings = Settings::under(home.path().to_path_buf(), None, None);
    std::fs::write(settings.ledger_path(), "{}").unwrap();

    let err = AppContext::with_config(&settings, &AuthConfig::new(SECRET)).unwrap_err();
    assert_eq!(commands::classify(&err).0, commands::EXIT_FAILURE);
}

#[test]
fn hash_password_output_verifies() {
    let mut out = Vec::new();
    commands::hash_password(&mut Cursor::new("hunter2\n"), &mut out).unwrap();
    let hash = String::from_utf8(out).unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(Argon2Verifier::default().verify(hash.trim(), "hunter2"));

    let err = commands::hash_password(&mut Cursor::new("\n"), &mut Vec::new()).unwrap_err();
    assert_eq!(commands::classify(&err).1, "password must not be empty");
}
