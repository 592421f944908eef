//! Flag wire format shared by the `get-flag` minting binary and the
//! `flag-admin` operator tooling.
//!
//! # Payload layout
//!
//! ```text
//! plaintext  = time_us (u64 BE) || challenge_id (u16 BE) || 0x00 * 6     16 bytes
//! ciphertext = AES-256(key, plaintext)                                  16 bytes
//! checksum   = challenge_id ^ w0 ^ w1 ^ ... ^ w7  (w = BE u16 words)     2 bytes
//! flag       = "flag{" || hex(ciphertext || checksum) || "}"
//! ```
//!
//! Nothing in this crate knows about process identity or where key files live
//! on disk; that policy belongs to the binaries.

pub mod checksum;
pub mod cipher;
pub mod error;
pub mod keyfile;
pub mod protocol;
pub mod record;
pub mod secret;

pub use error::FormatError;
pub use keyfile::{KeyFile, KeyFileError};
pub use protocol::FlagPayload;
pub use record::{ChallengeId, PlaintextRecord};
pub use secret::SecretKey;
