//! The signer collaborator.
//!
//! The pipeline hands an unsigned (or partially signed) transaction to a
//! `TransactionSigner` and gets back a signed one, or a refusal. How the
//! signature is produced is the signer's business.

use std::path::Path;

use async_trait::async_trait;
use sol_chain::{Keypair, Pubkey, SolError, SolTransaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("signing was rejected: {0}")]
    Rejected(String),

    #[error("cannot load key pair from {path}: {reason}")]
    KeyFile { path: String, reason: String },

    #[error(transparent)]
    Chain(#[from] SolError),
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// The fee payer and authority for every operation.
    fn pubkey(&self) -> Pubkey;

    /// Add this signer's signature. Signatures already present must be kept.
    async fn sign_transaction(&self, tx: SolTransaction) -> Result<SolTransaction, SignerError>;
}

/// Signs with a key pair held in process memory.
#[derive(Debug, Clone)]
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load a `solana-keygen` file: a JSON array of 64 bytes, secret seed
    /// followed by the public key.
    pub fn from_keygen_file(path: impl AsRef<Path>) -> Result<Self, SignerError> {
        let path = path.as_ref();
        let key_file_error = |reason: String| SignerError::KeyFile {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| key_file_error(e.to_string()))?;
        Self::from_keygen_json(&contents).map_err(|e| match e {
            SignerError::Chain(inner) => key_file_error(inner.to_string()),
            other => other,
        })
    }

    pub fn from_keygen_json(json: &str) -> Result<Self, SignerError> {
        let bytes: Vec<u8> = serde_json::from_str(json).map_err(|e| SignerError::KeyFile {
            path: "<inline>".into(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(Keypair::from_bytes(&bytes)?))
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut tx: SolTransaction,
    ) -> Result<SolTransaction, SignerError> {
        tx.partial_sign(&self.keypair)?;
        Ok(tx)
    }
}
