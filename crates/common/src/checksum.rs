//! Unkeyed XOR-fold checksum appended to every flag.
//!
//! The checksum binds the ciphertext to the challenge id it claims, so a
//! verifier can reject truncated or garbled flags before decrypting. It is
//! NOT a MAC: it does not depend on the key, and anyone can compute a
//! matching checksum for any ciphertext and any id.

use crate::cipher::BLOCK_LEN;

/// Byte length of the checksum field.
pub const CHECKSUM_LEN: usize = 2;

/// XOR together `seed` and the eight big-endian 16-bit words of `block`.
pub fn fold(seed: u16, block: &[u8; BLOCK_LEN]) -> u16 {
    block
        .chunks_exact(2)
        .fold(seed, |acc, word| acc ^ u16::from_be_bytes([word[0], word[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_block_returns_seed() {
        assert_eq!(fold(0xBEEF, &[0u8; BLOCK_LEN]), 0xBEEF);
    }

    #[test]
    fn words_are_big_endian() {
        let mut block = [0u8; BLOCK_LEN];
        block[0] = 0x12;
        block[1] = 0x34;
        assert_eq!(fold(0, &block), 0x1234);
    }

    #[test]
    fn every_bit_flip_changes_checksum() {
        let block: [u8; BLOCK_LEN] = core::array::from_fn(|i| (i as u8).wrapping_mul(37));
        let reference = fold(0x0042, &block);
        for byte in 0..BLOCK_LEN {
            for bit in 0..8 {
                let mut flipped = block;
                flipped[byte] ^= 1 << bit;
                assert_ne!(fold(0x0042, &flipped), reference, "byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn same_position_flips_in_two_words_cancel() {
        let block = [0x5Au8; BLOCK_LEN];
        let mut flipped = block;
        flipped[0] ^= 0x01;
        flipped[2] ^= 0x01;
        assert_eq!(fold(7, &flipped), fold(7, &block));
    }

    #[test]
    fn folding_twice_recovers_seed() {
        let block: [u8; BLOCK_LEN] = core::array::from_fn(|i| 0xF0 ^ i as u8);
        let checksum = fold(0x1337, &block);
        assert_eq!(fold(checksum, &block), 0x1337);
    }
}
