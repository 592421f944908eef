//! `flag-admin`: operator companion to `get-flag`.
//!
//! Startup sequence:
//! 1. Load and validate [`config::Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Run the requested subcommand.

mod config;
mod keystore;
mod telemetry;
mod verify;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{protocol, ChallengeId, FlagPayload};
use rand::rngs::OsRng;
use serde_json::json;
use tracing::{info, warn};

use config::Config;
use keystore::{InstallTarget, KeySource, KeyStore};
use verify::Verifier;

/// Provision flag keys, mint flags and check submitted flags.
#[derive(Parser, Debug)]
#[command(name = "flag-admin")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new random key for a challenge
    Keygen {
        /// Challenge id (0-65535)
        challenge_id: u16,

        /// Replace existing key files
        #[arg(long)]
        force: bool,

        /// Also install the key for get-flag: a numeric uid or `default`
        #[arg(long)]
        install_as: Option<InstallTarget>,

        /// Directory get-flag reads key files from
        #[arg(long, default_value = "/etc/flags")]
        install_dir: PathBuf,
    },

    /// Mint a flag for a challenge at a given time
    Mint {
        /// Challenge id (0-65535)
        challenge_id: u16,

        /// Issuance time in microseconds since the epoch (default: now)
        #[arg(long)]
        time_us: Option<u64>,
    },

    /// Verify flags; with no arguments, scan stdin for flags
    Check {
        /// Flags to verify
        flags: Vec<String>,

        /// Print one JSON object per flag
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cli = Cli::parse();
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: flag-admin configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;

    // -----------------------------------------------------------------------
    // 3. Command
    // -----------------------------------------------------------------------
    let store = KeyStore::new(&cfg.keystore_dir);
    match cli.command {
        Command::Keygen {
            challenge_id,
            force,
            install_as,
            install_dir,
        } => keygen(&store, challenge_id.into(), force, install_as, &install_dir),
        Command::Mint {
            challenge_id,
            time_us,
        } => mint(&store, &cfg, challenge_id.into(), time_us),
        Command::Check { flags, json } => check(&store, &cfg, flags, json),
    }
}

fn keygen(
    store: &KeyStore,
    challenge_id: ChallengeId,
    force: bool,
    install_as: Option<InstallTarget>,
    install_dir: &Path,
) -> Result<ExitCode> {
    let (key_file, path) = store
        .create(challenge_id, force, &mut OsRng)
        .with_context(|| format!("failed to create key for challenge {challenge_id}"))?;
    println!("{}", path.display());

    if let Some(target) = install_as {
        let installed = keystore::install(&key_file, install_dir, target, force)
            .with_context(|| format!("failed to install key for {target}"))?;
        println!("{}", installed.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn mint(
    store: &KeyStore,
    cfg: &Config,
    challenge_id: ChallengeId,
    time_us: Option<u64>,
) -> Result<ExitCode> {
    let key_file = store
        .key_for(challenge_id)
        .with_context(|| format!("failed to read key for challenge {challenge_id}"))?
        .with_context(|| format!("no key stored for challenge {challenge_id}"))?;
    if key_file.challenge_id != challenge_id {
        anyhow::bail!(
            "key stored for challenge {challenge_id} was provisioned for challenge {}",
            key_file.challenge_id
        );
    }

    let time_us = match time_us {
        Some(t) => t,
        None => now_micros()?,
    };
    let payload = FlagPayload::issue(&key_file.key, challenge_id, time_us);
    info!(challenge_id = %challenge_id, time_us, "flag minted");
    println!("{}", payload.render(&cfg.flag_prefix));
    Ok(ExitCode::SUCCESS)
}

fn check(store: &KeyStore, cfg: &Config, flags: Vec<String>, json: bool) -> Result<ExitCode> {
    let flags = if flags.is_empty() {
        // Program output may contain arbitrary bytes; flags are ASCII.
        let mut raw = Vec::new();
        io::stdin()
            .read_to_end(&mut raw)
            .context("failed to read stdin")?;
        let text = String::from_utf8_lossy(&raw);
        protocol::find_flags(&text, &cfg.flag_prefix)
            .map(str::to_owned)
            .collect()
    } else {
        flags
    };
    if flags.is_empty() {
        warn!("no flags found");
        return Ok(ExitCode::FAILURE);
    }

    let verifier = Verifier::new(store, &cfg.flag_prefix, cfg.window());
    let mut all_valid = true;
    for flag in &flags {
        let result = verifier.check(flag);
        all_valid &= result.is_ok();
        match (json, result) {
            (true, Ok(verified)) => {
                let mut line = serde_json::to_value(verified)?;
                line["flag"] = json!(flag);
                line["valid"] = json!(true);
                println!("{line}");
            }
            (true, Err(e)) => println!(
                "{}",
                json!({ "flag": flag, "valid": false, "error": e.to_string() })
            ),
            (false, Ok(verified)) => println!(
                "ok {flag} challenge={} issued_at_us={}",
                verified.challenge_id, verified.issued_at_us
            ),
            (false, Err(e)) => println!("invalid {flag}: {e}"),
        }
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn now_micros() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before the unix epoch")?;
    u64::try_from(elapsed.as_micros()).context("system clock out of range")
}
