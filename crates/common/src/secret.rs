//! [`SecretKey`]: owned, fixed-size key buffer that wipes itself on drop.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Raw AES-256 key material.
///
/// The bytes are overwritten with zeroes when the value is dropped, on every
/// exit path including `?` propagation and unwinding. The buffer is boxed so
/// that moving a `SecretKey` around never leaves stale copies of the key on
/// the stack.
#[derive(Clone)]
pub struct SecretKey(Box<[u8; KEY_LEN]>);

impl SecretKey {
    /// An all-zero key, to be filled in place via [`SecretKey::as_mut_bytes`].
    pub fn zeroed() -> Self {
        Self(Box::new([0u8; KEY_LEN]))
    }

    /// Copy key material out of `bytes`.
    ///
    /// Returns `None` if `bytes` is not exactly [`KEY_LEN`] bytes long. The
    /// caller stays responsible for wiping its own copy.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KEY_LEN {
            return None;
        }
        let mut key = Self::zeroed();
        key.0.copy_from_slice(bytes);
        Some(key)
    }

    /// Borrow the raw key bytes.
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8; KEY_LEN] {
        &mut self.0
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        (*self.0).zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("SecretKey([REDACTED])")
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        // Constant-time over the full length.
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl Eq for SecretKey {}
