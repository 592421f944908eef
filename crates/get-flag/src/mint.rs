//! Flag minting: timestamp the record, encrypt it, attach the checksum.

use common::{FlagPayload, KeyFile};
use tracing::debug;

use crate::clock::Clock;
use crate::error::FlagError;

/// Mint a flag for `key_file`'s challenge at the current time.
///
/// The challenge id is taken once from `key_file` and used for both the
/// plaintext record and the checksum seed.
///
/// # Errors
///
/// Propagates clock failures; encryption itself cannot fail.
pub fn mint<C: Clock + ?Sized>(key_file: &KeyFile, clock: &C) -> Result<FlagPayload, FlagError> {
    let time_us = clock.now_micros()?;
    let payload = FlagPayload::issue(&key_file.key, key_file.challenge_id, time_us);
    debug!(challenge_id = %key_file.challenge_id, time_us, "flag minted");
    Ok(payload)
}
