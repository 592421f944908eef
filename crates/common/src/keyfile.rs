//! Binary key-file format: `challenge_id (u16 BE) || key (32 bytes)`.
//!
//! No header, no version, exactly [`KEY_FILE_LEN`] bytes. Anything shorter or
//! longer is rejected.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;

use rand::{CryptoRng, RngCore};
use tempfile::NamedTempFile;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::record::ChallengeId;
use crate::secret::{SecretKey, KEY_LEN};

/// Exact size of a key file on disk.
pub const KEY_FILE_LEN: usize = 2 + KEY_LEN;

/// Errors produced while reading or writing key files.
#[derive(Debug, Error)]
pub enum KeyFileError {
    /// Opening, reading or writing the file failed.
    #[error("key file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The file ended before a full challenge id and key were read.
    #[error("key file truncated: expected {KEY_FILE_LEN} bytes, got {0}")]
    Truncated(usize),

    /// The file has bytes after the key.
    #[error("key file too long: expected exactly {KEY_FILE_LEN} bytes")]
    TrailingData,

    /// Refused to replace a file that already exists.
    #[error("key file already exists")]
    AlreadyExists,
}

/// A challenge id together with the key that mints its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFile {
    pub challenge_id: ChallengeId,
    pub key: SecretKey,
}

impl KeyFile {
    /// Generate a fresh random key for `challenge_id`.
    pub fn generate<R: RngCore + CryptoRng>(challenge_id: ChallengeId, rng: &mut R) -> Self {
        let mut key = SecretKey::zeroed();
        rng.fill_bytes(key.as_mut_bytes());
        Self { challenge_id, key }
    }

    /// Open `path` read-only and parse it.
    ///
    /// # Errors
    ///
    /// See [`KeyFile::read_from`]; additionally returns [`KeyFileError::Io`]
    /// if the file cannot be opened.
    pub fn load(path: &Path) -> Result<Self, KeyFileError> {
        let file = File::open(path)?;
        Self::read_from(file)
    }

    /// Read exactly one key file from `reader`: 2 bytes of challenge id, then
    /// 32 bytes of key, then end of input.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFileError::Truncated`] on a short read,
    /// [`KeyFileError::TrailingData`] if more input follows the key, and
    /// [`KeyFileError::Io`] on any read error.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, KeyFileError> {
        let mut id = [0u8; 2];
        let n = read_full(&mut reader, &mut id)?;
        if n != id.len() {
            return Err(KeyFileError::Truncated(n));
        }

        let mut key = SecretKey::zeroed();
        let n = read_full(&mut reader, key.as_mut_bytes())?;
        if n != KEY_LEN {
            return Err(KeyFileError::Truncated(id.len() + n));
        }

        let mut probe = [0u8; 1];
        if read_full(&mut reader, &mut probe)? != 0 {
            return Err(KeyFileError::TrailingData);
        }

        Ok(Self {
            challenge_id: ChallengeId::from_be_bytes(id),
            key,
        })
    }

    /// Serialise into the on-disk layout. The buffer is wiped on drop.
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEY_FILE_LEN]> {
        let mut out = Zeroizing::new([0u8; KEY_FILE_LEN]);
        out[..2].copy_from_slice(&self.challenge_id.to_be_bytes());
        out[2..].copy_from_slice(self.key.expose());
        out
    }

    /// Write this key file to `path` with owner-only permissions.
    ///
    /// The bytes go to a temporary file in the same directory first, which is
    /// then renamed over `path`. A failed write never leaves a partial key
    /// file behind, and a replaced file always ends up `0600`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyFileError::AlreadyExists`] if `path` exists and
    /// `overwrite` is false, or [`KeyFileError::Io`] on any write failure.
    pub fn write_to(&self, path: &Path, overwrite: bool) -> Result<(), KeyFileError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !overwrite && path.exists() {
            return Err(KeyFileError::AlreadyExists);
        }

        let mut staged = NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        staged.write_all(&self.to_bytes()[..])?;
        staged.as_file().sync_all()?;

        let persisted = if overwrite {
            staged.persist(path)
        } else {
            staged.persist_noclobber(path)
        };
        persisted.map_err(|e| match e.error.kind() {
            ErrorKind::AlreadyExists => KeyFileError::AlreadyExists,
            _ => KeyFileError::Io(e.error),
        })?;
        Ok(())
    }
}

/// Like `read_exact`, but reports how many bytes were read before EOF
/// instead of failing.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
