//! Runs the built `get-flag` binary against its compiled-in key paths.
//!
//! The paths are fixed at build time, so these tests only assert the failure
//! contract when neither key file exists on the host running them (the usual
//! case outside a provisioned challenge box). Point `FLAGS_KEY_UID_FILE` and
//! `FLAGS_KEY_FALLBACK_FILE` at a nonexistent directory when building to make
//! that hold everywhere.

use std::path::PathBuf;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_get-flag");

const PRINCIPAL_TEMPLATE: &str = match option_env!("FLAGS_KEY_UID_FILE") {
    Some(template) => template,
    None => "/etc/flags/{uid}.key",
};

const FALLBACK: &str = match option_env!("FLAGS_KEY_FALLBACK_FILE") {
    Some(path) => path,
    None => "/etc/flags/default.key",
};

fn candidate_paths() -> (PathBuf, PathBuf) {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let uid = unsafe { libc::geteuid() };
    (
        PathBuf::from(PRINCIPAL_TEMPLATE.replacen("{uid}", &uid.to_string(), 1)),
        PathBuf::from(FALLBACK),
    )
}

fn key_files_absent() -> bool {
    let (principal, fallback) = candidate_paths();
    !principal.exists() && !fallback.exists()
}

#[test]
fn missing_key_files_exit_1_without_stdout() {
    if !key_files_absent() {
        eprintln!("skipping: a key file is provisioned on this host");
        return;
    }

    let output = Command::new(BIN)
        .env_clear()
        .output()
        .expect("failed to spawn get-flag");

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    assert!(output.stdout.is_empty(), "{output:?}");

    let stderr = String::from_utf8_lossy(&output.stderr);
    let (principal, fallback) = candidate_paths();
    assert!(stderr.contains("oops, "), "{stderr}");
    assert!(stderr.contains(".rs:"), "{stderr}");
    assert!(stderr.contains("no accessible key file"), "{stderr}");
    assert!(stderr.contains(&principal.display().to_string()), "{stderr}");
    assert!(stderr.contains(&fallback.display().to_string()), "{stderr}");
}

#[test]
fn ignores_arguments_and_environment() {
    if !key_files_absent() {
        eprintln!("skipping: a key file is provisioned on this host");
        return;
    }

    let output = Command::new(BIN)
        .arg("--key")
        .arg("/tmp/attacker.key")
        .env("FLAGS_KEY_FALLBACK_FILE", "/tmp/attacker.key")
        .env("RUST_LOG", "trace")
        .output()
        .expect("failed to spawn get-flag");

    assert_eq!(output.status.code(), Some(1), "{output:?}");
    assert!(output.stdout.is_empty(), "{output:?}");
    assert!(!String::from_utf8_lossy(&output.stderr).contains("attacker"));
}
