//! Key resolution: pick the key file for the effective user and load it.
//!
//! # Resolution order
//!
//! 1. `<principal_template>` with `{uid}` replaced by the effective uid.
//! 2. The shared fallback file.
//!
//! Each candidate is probed with the effective identity (see
//! [`EffectiveAccess`]). If neither is accessible the run fails; there is no
//! retry. The chosen file must be exactly 34 bytes (see
//! [`common::keyfile`]).
//!
//! # Security invariants
//!
//! - Key material lives only inside [`KeyFile`] / [`common::SecretKey`], which
//!   wipe themselves on drop, including when an error unwinds the pipeline.
//! - Key bytes are never logged. Paths, uid and challenge id may be.

pub mod probe;

pub use probe::{effective_uid, AccessProbe, EffectiveAccess};

use std::path::PathBuf;

use common::KeyFile;
use tracing::debug;

use crate::config::KeyPaths;
use crate::error::{ErrorKind, FlagError};

/// Find the key file for `uid` under `paths`.
///
/// # Errors
///
/// Returns [`ErrorKind::PathTooLong`] if the principal path cannot be formed,
/// or [`ErrorKind::NoKeyFile`] if neither candidate is accessible.
pub fn locate<P: AccessProbe + ?Sized>(
    paths: &KeyPaths,
    uid: u32,
    probe: &P,
) -> Result<PathBuf, FlagError> {
    let principal = paths.principal_path(uid)?;
    if probe.accessible(&principal) {
        debug!(uid, path = %principal.display(), "using uid-specific key file");
        return Ok(principal);
    }
    if probe.accessible(&paths.fallback) {
        debug!(uid, path = %paths.fallback.display(), "using fallback key file");
        return Ok(paths.fallback.clone());
    }
    Err(FlagError::new(ErrorKind::NoKeyFile {
        principal,
        fallback: paths.fallback.clone(),
    }))
}

/// Locate and load the key file for `uid`.
///
/// # Errors
///
/// See [`locate`]; additionally returns [`ErrorKind::KeyFile`] if the chosen
/// file cannot be read or is not exactly 34 bytes.
pub fn resolve<P: AccessProbe + ?Sized>(
    paths: &KeyPaths,
    uid: u32,
    probe: &P,
) -> Result<KeyFile, FlagError> {
    let path = locate(paths, uid, probe)?;
    match KeyFile::load(&path) {
        Ok(key_file) => {
            debug!(challenge_id = %key_file.challenge_id, "key file loaded");
            Ok(key_file)
        }
        Err(source) => Err(FlagError::new(ErrorKind::KeyFile { path, source })),
    }
}
