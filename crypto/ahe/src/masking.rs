//! Mask key and oracle-side encryption/decryption
//!
//! Pads are derived with keyed BLAKE3: `pad(nonce)` is the first four
//! bytes (LE) of `blake3::keyed_hash(key, nonce)`. Encryption draws a
//! fresh random nonce per value; decryption walks the ciphertext's tag
//! list and subtracts every pad. Only the oracle holds the key.

use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::ciphertext::{Ciphertext, PadTag, PAD_NONCE_BYTES};

/// Number of bytes in a mask key
pub const MASK_KEY_BYTES: usize = 32;

/// Symmetric PRF key for the masking scheme
///
/// Held by the decryption oracle only; zeroed on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct MaskKey([u8; MASK_KEY_BYTES]);

impl MaskKey {
    /// Generate a fresh random key
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; MASK_KEY_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Reconstruct a key from raw bytes
    pub fn from_bytes(bytes: [u8; MASK_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; MASK_KEY_BYTES] {
        &self.0
    }

    /// Derive the pad value named by a tag
    fn pad(&self, tag: &PadTag) -> u32 {
        let digest = blake3::keyed_hash(&self.0, tag.as_bytes());
        let bytes = digest.as_bytes();
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Encrypt a value under a fresh random pad
    pub fn encrypt<R: RngCore + CryptoRng>(&self, value: u32, rng: &mut R) -> Ciphertext {
        let mut nonce = [0u8; PAD_NONCE_BYTES];
        rng.fill_bytes(&mut nonce);
        let tag = PadTag::from_bytes(nonce);
        let masked = value.wrapping_add(self.pad(&tag));
        Ciphertext::new(masked, vec![tag])
    }

    /// Decrypt by subtracting every named pad
    pub fn decrypt(&self, ct: &Ciphertext) -> u32 {
        let mut value = ct.masked();
        for tag in ct.pads() {
            value = value.wrapping_sub(self.pad(tag));
        }
        value
    }
}

impl std::fmt::Debug for MaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskKey").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_key() -> (MaskKey, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let key = MaskKey::generate(&mut rng);
        (key, rng)
    }

    #[test]
    fn test_encrypt_decrypt() {
        let (key, mut rng) = test_key();

        let ct = key.encrypt(12345, &mut rng);
        assert!(!ct.is_trivial());
        assert_ne!(ct.pad_count(), 0);
        assert_eq!(key.decrypt(&ct), 12345);
    }

    #[test]
    fn test_decrypt_trivial_needs_no_key_material() {
        let (key, _) = test_key();
        assert_eq!(key.decrypt(&Ciphertext::trivial(99)), 99);
        assert_eq!(key.decrypt(&Ciphertext::zero()), 0);
    }

    #[test]
    fn test_homomorphic_sum() {
        let (key, mut rng) = test_key();

        let a = key.encrypt(5, &mut rng);
        let b = key.encrypt(7, &mut rng);
        let c = Ciphertext::trivial(3);

        let sum = a.add_ct(&b).add_ct(&c);
        assert_eq!(key.decrypt(&sum), 15);
    }

    #[test]
    fn test_sum_is_association_independent() {
        let (key, mut rng) = test_key();

        let values = [10u32, 20, 30, 40];
        let cts: Vec<Ciphertext> = values.iter().map(|&v| key.encrypt(v, &mut rng)).collect();

        let left = cts
            .iter()
            .fold(Ciphertext::zero(), |acc, ct| acc.add_ct(ct));
        let right = cts
            .iter()
            .rev()
            .fold(Ciphertext::zero(), |acc, ct| acc.add_ct(ct));

        assert_eq!(key.decrypt(&left), 100);
        assert_eq!(key.decrypt(&right), 100);
    }

    #[test]
    fn test_wrapping_sum() {
        let (key, mut rng) = test_key();

        let a = key.encrypt(u32::MAX, &mut rng);
        let b = key.encrypt(3, &mut rng);
        assert_eq!(key.decrypt(&a.add_ct(&b)), 2);
    }

    #[test]
    fn test_wrong_key_garbles() {
        let (key, mut rng) = test_key();
        let other = MaskKey::generate(&mut rng);

        let ct = key.encrypt(777, &mut rng);
        assert_ne!(other.decrypt(&ct), 777);
    }

    #[test]
    fn test_key_round_trip() {
        let (key, mut rng) = test_key();
        let restored = MaskKey::from_bytes(*key.as_bytes());

        let ct = key.encrypt(55, &mut rng);
        assert_eq!(restored.decrypt(&ct), 55);
    }
}
