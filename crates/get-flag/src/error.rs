//! Error type for the minting pipeline.
//!
//! Every component returns [`FlagError`]; nothing is retried or recovered.
//! The single handler in `main` turns it into a one-line diagnostic on stderr
//! and exit status 1.

use std::fmt;
use std::io;
use std::panic::Location;
use std::path::PathBuf;
use std::time::SystemTimeError;

use common::KeyFileError;
use thiserror::Error;

use crate::config::MAX_PATH_LEN;

/// What went wrong.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The built-in key path configuration is unusable.
    #[error("invalid key path configuration: {0}")]
    Config(String),

    /// Formatting the principal key path produced an over-long path.
    #[error("key file path for uid {0} exceeds {MAX_PATH_LEN} bytes")]
    PathTooLong(u32),

    /// Neither the principal-specific nor the fallback key file is accessible.
    #[error(
        "no accessible key file (tried {} and {})",
        .principal.display(),
        .fallback.display()
    )]
    NoKeyFile { principal: PathBuf, fallback: PathBuf },

    /// The resolved key file could not be opened or has the wrong size.
    #[error("cannot load key file {}: {source}", .path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: KeyFileError,
    },

    /// The wall clock reads earlier than the Unix epoch.
    #[error("system clock is before the unix epoch")]
    ClockBeforeEpoch(#[source] SystemTimeError),

    /// Microseconds since the epoch no longer fit in 64 bits.
    #[error("system clock is out of the 64-bit microsecond range")]
    ClockOverflow,

    /// Writing the flag line to stdout failed.
    #[error("cannot write flag to stdout: {0}")]
    Output(#[source] io::Error),
}

impl ErrorKind {
    /// Short name of the pipeline step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            ErrorKind::Config(_) | ErrorKind::PathTooLong(_) => "config",
            ErrorKind::NoKeyFile { .. } => "resolve",
            ErrorKind::KeyFile { .. } => "load",
            ErrorKind::ClockBeforeEpoch(_) | ErrorKind::ClockOverflow => "clock",
            ErrorKind::Output(_) => "output",
        }
    }
}

/// An [`ErrorKind`] tagged with the source position that raised it.
#[derive(Debug)]
pub struct FlagError {
    kind: ErrorKind,
    location: &'static Location<'static>,
}

impl FlagError {
    /// Record `kind` at the caller's position.
    #[track_caller]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: Location::caller(),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.location().file(),
            self.location().line(),
            self.kind
        )
    }
}

impl std::error::Error for FlagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_caller_location() {
        let line = line!() + 1;
        let err = FlagError::new(ErrorKind::ClockOverflow);
        assert_eq!(err.location().line(), line);
        assert!(err.location().file().ends_with("error.rs"));
    }

    #[test]
    fn display_has_position_and_message() {
        let err = FlagError::new(ErrorKind::NoKeyFile {
            principal: "/etc/flags/1000.key".into(),
            fallback: "/etc/flags/default.key".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("error.rs:"));
        assert!(msg.contains("/etc/flags/1000.key"));
        assert!(msg.contains("/etc/flags/default.key"));
    }

    #[test]
    fn steps() {
        assert_eq!(ErrorKind::PathTooLong(0).step(), "config");
        assert_eq!(ErrorKind::ClockOverflow.step(), "clock");
        assert_eq!(
            ErrorKind::KeyFile {
                path: "/x".into(),
                source: KeyFileError::TrailingData,
            }
            .step(),
            "load"
        );
    }
}
