//! Single-block AES-256 encryption of plaintext records.
//!
//! A record is exactly one block and carries a microsecond timestamp, so no
//! chaining mode or IV is involved: the block goes straight through the
//! cipher. Key schedules are wiped on drop (`aes` crate `zeroize` feature).

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;

use crate::record::{PlaintextRecord, RECORD_LEN};
use crate::secret::SecretKey;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = RECORD_LEN;

fn key_schedule(key: &SecretKey) -> Aes256 {
    Aes256::new(GenericArray::from_slice(key.expose()))
}

/// Encrypt `record` under `key`, returning the raw ciphertext block.
pub fn encrypt_record(key: &SecretKey, record: &PlaintextRecord) -> [u8; BLOCK_LEN] {
    let cipher = key_schedule(key);
    // Encrypted in place, so the output buffer never holds plaintext once
    // this returns.
    let mut block = *record.as_bytes();
    cipher.encrypt_block(GenericArray::from_mut_slice(&mut block));
    block
}

/// Decrypt a ciphertext block back into a record.
pub fn decrypt_block(key: &SecretKey, block: &[u8; BLOCK_LEN]) -> PlaintextRecord {
    let cipher = key_schedule(key);
    let mut record = PlaintextRecord::from_bytes(*block);
    cipher.decrypt_block(GenericArray::from_mut_slice(record.as_mut_bytes()));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChallengeId;

    fn key(bytes: &[u8]) -> SecretKey {
        SecretKey::from_slice(bytes).unwrap()
    }

    #[test]
    fn fips_197_aes256_vector() {
        let key = key(&hex::decode(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        )
        .unwrap());
        let mut plain = [0u8; BLOCK_LEN];
        plain.copy_from_slice(&hex::decode("00112233445566778899aabbccddeeff").unwrap());
        let record = PlaintextRecord::from_bytes(plain);
        assert_eq!(
            hex::encode(encrypt_record(&key, &record)),
            "8ea2b7ca516745bfeafc49904b496089"
        );
    }

    #[test]
    fn zero_key_example_record() {
        let record = PlaintextRecord::encode(0, ChallengeId(1));
        assert_eq!(
            hex::encode(encrypt_record(&key(&[0u8; 32]), &record)),
            "a1cf369949677a3af3d58e3eabf2741b"
        );
    }

    #[test]
    fn encryption_is_deterministic() {
        let key = key(&[0x42u8; 32]);
        let record = PlaintextRecord::encode(1_234_567, ChallengeId(9));
        assert_eq!(encrypt_record(&key, &record), encrypt_record(&key, &record));
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let key = key(&[0x17u8; 32]);
        let record = PlaintextRecord::encode(987_654_321, ChallengeId(300));
        let block = encrypt_record(&key, &record);
        assert_ne!(&block, record.as_bytes());
        assert_eq!(decrypt_block(&key, &block), record);
    }

    #[test]
    fn wrong_key_yields_garbage() {
        let record = PlaintextRecord::encode(55, ChallengeId(2));
        let block = encrypt_record(&key(&[1u8; 32]), &record);
        let opened = decrypt_block(&key(&[2u8; 32]), &block);
        assert_ne!(opened, record);
    }
}
