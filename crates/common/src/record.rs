//! The 16-byte plaintext record that gets encrypted into a flag.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of a plaintext record (one AES block).
pub const RECORD_LEN: usize = 16;

/// Number of trailing zero bytes in a record.
pub const PADDING_LEN: usize = 6;

const TIME_RANGE: std::ops::Range<usize> = 0..8;
const CHALLENGE_RANGE: std::ops::Range<usize> = 8..10;
const PADDING_RANGE: std::ops::Range<usize> = 10..RECORD_LEN;

/// Identifies which challenge a key (and therefore a flag) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub u16);

impl ChallengeId {
    pub fn get(self) -> u16 {
        self.0
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_be_bytes(bytes))
    }
}

impl From<u16> for ChallengeId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `time_us (u64 BE) || challenge_id (u16 BE) || [0; 6]`.
///
/// Multi-byte fields are always big-endian so the verifier can parse the
/// record without knowing the minting host's byte order. The buffer is wiped
/// when the record is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PlaintextRecord([u8; RECORD_LEN]);

impl PlaintextRecord {
    /// Lay out a fresh record for `time_us` microseconds since the epoch.
    pub fn encode(time_us: u64, challenge_id: ChallengeId) -> Self {
        let mut buf = [0u8; RECORD_LEN];
        buf[TIME_RANGE].copy_from_slice(&time_us.to_be_bytes());
        buf[CHALLENGE_RANGE].copy_from_slice(&challenge_id.to_be_bytes());
        Self(buf)
    }

    /// Wrap a decrypted block. The padding is not checked here; see
    /// [`PlaintextRecord::padding_is_zero`].
    pub fn from_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn time_us(&self) -> u64 {
        let mut time = [0u8; 8];
        time.copy_from_slice(&self.0[TIME_RANGE]);
        u64::from_be_bytes(time)
    }

    pub fn challenge_id(&self) -> ChallengeId {
        ChallengeId::from_be_bytes([self.0[CHALLENGE_RANGE.start], self.0[CHALLENGE_RANGE.start + 1]])
    }

    pub fn padding_is_zero(&self) -> bool {
        self.0[PADDING_RANGE].iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8; RECORD_LEN] {
        &self.0
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; RECORD_LEN] {
        &mut self.0
    }
}

impl fmt::Debug for PlaintextRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextRecord([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_big_endian() {
        let record = PlaintextRecord::encode(0x0102_0304_0506_0708, ChallengeId(0x0A0B));
        assert_eq!(
            record.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 8, 0x0A, 0x0B, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn zero_time_example() {
        let record = PlaintextRecord::encode(0, ChallengeId(1));
        assert_eq!(
            record.as_bytes(),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn fields_read_back() {
        let record = PlaintextRecord::encode(1_700_000_000_123_456, ChallengeId(4242));
        assert_eq!(record.time_us(), 1_700_000_000_123_456);
        assert_eq!(record.challenge_id(), ChallengeId(4242));
        assert!(record.padding_is_zero());
    }

    #[test]
    fn nonzero_padding_detected() {
        let mut bytes = *PlaintextRecord::encode(5, ChallengeId(5)).as_bytes();
        bytes[RECORD_LEN - 1] = 1;
        assert!(!PlaintextRecord::from_bytes(bytes).padding_is_zero());
    }

    #[test]
    fn zeroize_clears_record() {
        let mut record = PlaintextRecord::encode(u64::MAX, ChallengeId(u16::MAX));
        record.zeroize();
        assert_eq!(record.as_bytes(), &[0u8; RECORD_LEN]);
    }

    #[test]
    fn challenge_id_serialises_as_number() {
        let json = serde_json::to_string(&ChallengeId(17)).unwrap();
        assert_eq!(json, "17");
    }
}
