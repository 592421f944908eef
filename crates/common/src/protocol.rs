//! [`FlagPayload`]: the 18-byte `ciphertext || checksum` value and its
//! `flag{<hex>}` text form.

use std::fmt;

use crate::checksum::{self, CHECKSUM_LEN};
use crate::cipher::{self, BLOCK_LEN};
use crate::error::FormatError;
use crate::record::{ChallengeId, PlaintextRecord};
use crate::secret::SecretKey;

/// Byte length of a payload (ciphertext block plus checksum).
pub const PAYLOAD_LEN: usize = BLOCK_LEN + CHECKSUM_LEN;

/// Number of hex digits in a rendered flag body.
pub const HEX_LEN: usize = PAYLOAD_LEN * 2;

/// Prefix written in front of the braces.
pub const DEFAULT_PREFIX: &str = "flag";

/// One encrypted flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagPayload {
    ciphertext: [u8; BLOCK_LEN],
    checksum: u16,
}

impl FlagPayload {
    /// Encrypt a record for `challenge_id` issued at `time_us` and attach its
    /// checksum.
    ///
    /// The same `challenge_id` value goes into both the plaintext record and
    /// the checksum seed.
    pub fn issue(key: &SecretKey, challenge_id: ChallengeId, time_us: u64) -> Self {
        let record = PlaintextRecord::encode(time_us, challenge_id);
        let ciphertext = cipher::encrypt_record(key, &record);
        Self::seal(ciphertext, challenge_id)
    }

    /// Attach the checksum for `challenge_id` to an already encrypted block.
    pub fn seal(ciphertext: [u8; BLOCK_LEN], challenge_id: ChallengeId) -> Self {
        Self {
            checksum: checksum::fold(challenge_id.get(), &ciphertext),
            ciphertext,
        }
    }

    pub fn ciphertext(&self) -> &[u8; BLOCK_LEN] {
        &self.ciphertext
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// The challenge id this payload's checksum was seeded with.
    ///
    /// Recomputable by anyone; it only tells a verifier which key to try.
    pub fn claimed_challenge_id(&self) -> ChallengeId {
        ChallengeId(checksum::fold(self.checksum, &self.ciphertext))
    }

    /// Decrypt the ciphertext block. Callers must check the returned record's
    /// padding and challenge id themselves.
    pub fn open(&self, key: &SecretKey) -> PlaintextRecord {
        cipher::decrypt_block(key, &self.ciphertext)
    }

    pub fn to_bytes(&self) -> [u8; PAYLOAD_LEN] {
        let mut out = [0u8; PAYLOAD_LEN];
        out[..BLOCK_LEN].copy_from_slice(&self.ciphertext);
        out[BLOCK_LEN..].copy_from_slice(&self.checksum.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; PAYLOAD_LEN]) -> Self {
        let mut ciphertext = [0u8; BLOCK_LEN];
        ciphertext.copy_from_slice(&bytes[..BLOCK_LEN]);
        Self {
            ciphertext,
            checksum: u16::from_be_bytes([bytes[BLOCK_LEN], bytes[BLOCK_LEN + 1]]),
        }
    }

    /// `<prefix>{<36 lowercase hex digits>}`, without a trailing newline.
    pub fn render(&self, prefix: &str) -> String {
        format!("{prefix}{{{}}}", hex::encode(self.to_bytes()))
    }

    /// Parse a rendered flag. Surrounding whitespace is ignored and the hex
    /// body may be in either case. Anything after the closing brace is
    /// rejected; use [`find_flags`] to pull flags out of longer text.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] describing the first structural problem found.
    pub fn parse(text: &str, prefix: &str) -> Result<Self, FormatError> {
        let body = text
            .trim()
            .strip_prefix(prefix)
            .ok_or_else(|| FormatError::MissingPrefix(prefix.to_owned()))?;
        let hex_body = body
            .strip_prefix('{')
            .and_then(|b| b.strip_suffix('}'))
            .ok_or(FormatError::MissingBraces)?;
        if hex_body.len() != HEX_LEN {
            return Err(FormatError::InvalidLength(hex_body.len()));
        }
        let mut bytes = [0u8; PAYLOAD_LEN];
        hex::decode_to_slice(hex_body, &mut bytes).map_err(|_| FormatError::InvalidHex)?;
        Ok(Self::from_bytes(&bytes))
    }
}

impl fmt::Display for FlagPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_PREFIX))
    }
}

/// Every well-formed `<prefix>{<36 hex>}` substring of `text`, in order.
///
/// Every start position is tried, so a prefix that overlaps itself (`aa` in
/// `aaa{...}`) still finds the flag.
pub fn find_flags<'a>(text: &'a str, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.char_indices().filter_map(move |(start, _)| {
        if prefix.is_empty() || !text[start..].starts_with(prefix) {
            return None;
        }
        let body_start = start + prefix.len();
        let body = text[body_start..].as_bytes();
        let well_formed = body.len() >= HEX_LEN + 2
            && body[0] == b'{'
            && body[1..=HEX_LEN].iter().all(u8::is_ascii_hexdigit)
            && body[HEX_LEN + 1] == b'}';
        well_formed.then(|| &text[start..body_start + HEX_LEN + 2])
    })
}
