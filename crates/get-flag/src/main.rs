//! `get-flag`: mints a fresh flag for the challenge owned by the effective user.
//!
//! Startup sequence:
//! 1. Initialise stderr logging.
//! 2. Validate the compiled-in [`KeyPaths`].
//! 3. Resolve and load the key file for the effective uid.
//! 4. Read the clock, encrypt the record, append the checksum.
//! 5. Print `flag{<36 hex>}` on stdout.
//!
//! Any failure prints `oops, <file>:<line>: <message>` on stderr and exits
//! with status 1. Nothing is written to stdout unless every step succeeded.

mod clock;
mod config;
mod error;
mod keys;
mod mint;
mod telemetry;

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use common::protocol::DEFAULT_PREFIX;
use tracing::debug;

use clock::{Clock, SystemClock};
use config::KeyPaths;
use error::{ErrorKind, FlagError};
use keys::{AccessProbe, EffectiveAccess};

fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(telemetry::LOG_LEVEL) {
        eprintln!("warning: {e}");
    }

    // -----------------------------------------------------------------------
    // 2-5. Configuration, key, flag, output
    // -----------------------------------------------------------------------
    let result = KeyPaths::builtin().and_then(|paths| {
        run(
            &paths,
            keys::effective_uid(),
            &EffectiveAccess,
            &SystemClock,
            &mut io::stdout().lock(),
        )
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Mint a flag for `uid` and write it, newline-terminated, to `out`.
fn run<W: Write + ?Sized>(
    paths: &KeyPaths,
    uid: u32,
    probe: &dyn AccessProbe,
    clock: &dyn Clock,
    out: &mut W,
) -> Result<(), FlagError> {
    let line = generate(paths, uid, probe, clock)?;
    out.write_all(line.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|e| FlagError::new(ErrorKind::Output(e)))
}

/// Produce the complete output line in memory.
fn generate(
    paths: &KeyPaths,
    uid: u32,
    probe: &dyn AccessProbe,
    clock: &dyn Clock,
) -> Result<String, FlagError> {
    let key_file = keys::resolve(paths, uid, probe)?;
    let payload = mint::mint(&key_file, clock)?;
    drop(key_file);
    Ok(format!("{}\n", payload.render(DEFAULT_PREFIX)))
}

fn report(err: &FlagError) {
    debug!(step = err.kind().step(), "flag generation aborted");
    let msg = format!("oops, {err}");
    if io::stderr().is_terminal() {
        eprintln!("\x1b[31m{msg}\x1b[0m");
    } else {
        eprintln!("{msg}");
    }
}
