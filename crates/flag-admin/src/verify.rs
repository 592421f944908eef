//! Flag verification.
//!
//! A flag is accepted only if all of the following hold:
//!
//! 1. It parses as `<prefix>{<36 hex>}`.
//! 2. A key exists for the challenge id recovered from its checksum, and that
//!    key file was provisioned for the same id.
//! 3. The block decrypts to a record with zero padding and the same id.
//! 4. Its timestamp lies inside the configured freshness window.
//!
//! The checksum alone proves nothing (it is unkeyed); step 3 is what ties a
//! flag to a key.

use common::{ChallengeId, FlagPayload, FormatError, KeyFileError};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::FreshnessWindow;
use crate::keystore::KeySource;

/// Why a flag was rejected.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("malformed flag: {0}")]
    Format(#[from] FormatError),

    #[error("no key for challenge {0}")]
    UnknownChallenge(ChallengeId),

    #[error("key for challenge {0} is unreadable: {1}")]
    Key(ChallengeId, #[source] KeyFileError),

    #[error("key stored for challenge {claimed} was provisioned for challenge {stored}")]
    KeyMismatch {
        claimed: ChallengeId,
        stored: ChallengeId,
    },

    #[error("flag does not decrypt to a valid record for challenge {0}")]
    Corrupt(ChallengeId),

    #[error("flag issued at {issued_at_us}us is outside the validity window")]
    NotFresh { issued_at_us: u64 },
}

/// A flag that passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifiedFlag {
    pub challenge_id: ChallengeId,
    pub issued_at_us: u64,
}

/// Checks flags against a key source and freshness window.
pub struct Verifier<'a, K: KeySource + ?Sized> {
    keys: &'a K,
    prefix: &'a str,
    window: FreshnessWindow,
}

impl<'a, K: KeySource + ?Sized> Verifier<'a, K> {
    pub fn new(keys: &'a K, prefix: &'a str, window: FreshnessWindow) -> Self {
        Self {
            keys,
            prefix,
            window,
        }
    }

    /// Verify one rendered flag.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckError`] encountered, in the order listed in
    /// the module documentation.
    pub fn check(&self, text: &str) -> Result<VerifiedFlag, CheckError> {
        let payload = FlagPayload::parse(text, self.prefix)?;
        let claimed = payload.claimed_challenge_id();

        let key_file = self
            .keys
            .key_for(claimed)
            .map_err(|e| CheckError::Key(claimed, e))?
            .ok_or(CheckError::UnknownChallenge(claimed))?;
        if key_file.challenge_id != claimed {
            return Err(CheckError::KeyMismatch {
                claimed,
                stored: key_file.challenge_id,
            });
        }

        let record = payload.open(&key_file.key);
        if !record.padding_is_zero() || record.challenge_id() != claimed {
            debug!(challenge_id = %claimed, "flag failed to decrypt cleanly");
            return Err(CheckError::Corrupt(claimed));
        }

        let issued_at_us = record.time_us();
        if !self.window.contains(issued_at_us) {
            return Err(CheckError::NotFresh { issued_at_us });
        }

        Ok(VerifiedFlag {
            challenge_id: claimed,
            issued_at_us,
        })
    }
}
