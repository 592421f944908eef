//! [`KeyStore`]: the operator's directory of per-challenge key files.
//!
//! Files are named `<challenge_id>.key` and use the same 34-byte layout that
//! `get-flag` reads. Installing a key copies it under the name `get-flag`
//! looks for (`<uid>.key` or `default.key`).

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use common::{ChallengeId, KeyFile, KeyFileError};
use rand::{CryptoRng, RngCore};
use tracing::info;

/// Somewhere to look up the key for a challenge.
pub trait KeySource {
    /// Returns `Ok(None)` if no key exists for `challenge_id`.
    fn key_for(&self, challenge_id: ChallengeId) -> Result<Option<KeyFile>, KeyFileError>;
}

/// Directory-backed key store.
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, challenge_id: ChallengeId) -> PathBuf {
        self.dir.join(format!("{challenge_id}.key"))
    }

    /// Generate and persist a new key for `challenge_id`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFileError::AlreadyExists`] if a key is already stored and
    /// `overwrite` is false, or [`KeyFileError::Io`] on write failure.
    pub fn create<R: RngCore + CryptoRng>(
        &self,
        challenge_id: ChallengeId,
        overwrite: bool,
        rng: &mut R,
    ) -> Result<(KeyFile, PathBuf), KeyFileError> {
        fs::create_dir_all(&self.dir)?;
        let key_file = KeyFile::generate(challenge_id, rng);
        let path = self.path_for(challenge_id);
        key_file.write_to(&path, overwrite)?;
        info!(challenge_id = %challenge_id, path = %path.display(), "key file created");
        Ok((key_file, path))
    }
}

impl KeySource for KeyStore {
    fn key_for(&self, challenge_id: ChallengeId) -> Result<Option<KeyFile>, KeyFileError> {
        match KeyFile::load(&self.path_for(challenge_id)) {
            Ok(key_file) => Ok(Some(key_file)),
            Err(KeyFileError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Which `get-flag` key file name a key is installed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallTarget {
    /// `<uid>.key`, used when `get-flag` runs with this effective uid.
    Uid(u32),
    /// `default.key`, used when no uid-specific file is accessible.
    Default,
}

impl InstallTarget {
    pub fn file_name(&self) -> String {
        match self {
            InstallTarget::Uid(uid) => format!("{uid}.key"),
            InstallTarget::Default => "default.key".into(),
        }
    }
}

impl FromStr for InstallTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(InstallTarget::Default);
        }
        s.parse()
            .map(InstallTarget::Uid)
            .map_err(|_| format!("expected a numeric uid or `default`, got {s:?}"))
    }
}

impl fmt::Display for InstallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallTarget::Uid(uid) => write!(f, "uid {uid}"),
            InstallTarget::Default => f.write_str("default"),
        }
    }
}

/// Copy `key_file` into `dir` under the name `get-flag` expects for `target`.
///
/// # Errors
///
/// Same as [`KeyFile::write_to`].
pub fn install(
    key_file: &KeyFile,
    dir: &Path,
    target: InstallTarget,
    overwrite: bool,
) -> Result<PathBuf, KeyFileError> {
    let path = dir.join(target.file_name());
    key_file.write_to(&path, overwrite)?;
    info!(
        challenge_id = %key_file.challenge_id,
        target = %target,
        path = %path.display(),
        "key file installed"
    );
    Ok(path)
}
