//! Ed25519 key pairs.
//!
//! A Solana key pair is an Ed25519 signing key whose verifying key doubles as
//! the account address. `solana-keygen` stores key pairs as a JSON array of 64
//! bytes: the 32-byte secret seed followed by the 32-byte public key.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::address::Pubkey;
use crate::error::SolError;

/// An Ed25519 key pair. The secret half is zeroized on drop.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh key pair from the operating system RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a key pair from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut copy = *seed;
        let signing_key = SigningKey::from_bytes(&copy);
        copy.zeroize();
        Self { signing_key }
    }

    /// Parse the 64-byte `seed || pubkey` layout used by `solana-keygen`.
    ///
    /// The trailing public key must match the one derived from the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        if bytes.len() != 64 {
            return Err(SolError::InvalidKeypair(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();

        if keypair.pubkey().as_bytes()[..] != bytes[32..] {
            return Err(SolError::InvalidKeypair(
                "public key does not match secret key".into(),
            ));
        }

        Ok(keypair)
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign arbitrary bytes, returning the 64-byte Ed25519 signature.
    pub fn sign_message(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// Verify an Ed25519 signature made by `pubkey` over `message`.
pub fn verify_signature(pubkey: &Pubkey, message: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(pubkey.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    vk.verify_strict(message, &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keypairs_differ() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        assert_ne!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn from_seed_is_deterministic() {
        let a = Keypair::from_seed(&[0x42; 32]);
        let b = Keypair::from_seed(&[0x42; 32]);
        assert_eq!(a.pubkey(), b.pubkey());
    }

    #[test]
    fn keygen_layout_roundtrip() {
        let kp = Keypair::from_seed(&[7u8; 32]);
        let mut bytes = vec![7u8; 32];
        bytes.extend_from_slice(kp.pubkey().as_bytes());

        let parsed = Keypair::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.pubkey(), kp.pubkey());
    }

    #[test]
    fn keygen_layout_with_wrong_pubkey_fails() {
        let mut bytes = vec![7u8; 32];
        bytes.extend_from_slice(&[9u8; 32]);
        let err = Keypair::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn keygen_layout_wrong_length_fails() {
        assert!(Keypair::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn signatures_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign_message(b"hello");
        assert!(verify_signature(&kp.pubkey(), b"hello", &sig));
        assert!(!verify_signature(&kp.pubkey(), b"other", &sig));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::from_seed(&[0xAB; 32]);
        let debug = format!("{kp:?}");
        assert!(debug.contains("pubkey"));
        assert!(!debug.contains("signing_key"));
    }
}
