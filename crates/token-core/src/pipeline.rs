//! Sign, broadcast, confirm.
//!
//! One prepared operation goes through six steps in strict order:
//!
//! 1. fetch a freshness token (recent blockhash + last valid block height)
//! 2. compile the draft with the signer as fee payer, bound to that blockhash
//! 3. partially sign with every extra key pair the operation carries
//! 4. hand the transaction to the external signer
//! 5. broadcast the wire bytes
//! 6. confirm against the same freshness token
//!
//! Nothing has touched the ledger until step 5. A broadcast failure is never
//! retried here: the caller restarts the whole operation with a new token.

use serde::Serialize;
use sol_chain::{Pubkey, SolInstruction, SolTransaction};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, TokenError};
use crate::rpc::{ConfirmationOutcome, FreshnessToken, LedgerRpc};
use crate::sequencer::PreparedOperation;
use crate::signer::TransactionSigner;

/// What a successful operation hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReceipt {
    pub signature: String,
    /// The new mint, or the account that received tokens.
    pub address: Pubkey,
}

/// An unsigned transaction bound to one freshness token. Used once.
#[derive(Debug)]
pub struct TransactionDraft {
    pub instructions: Vec<SolInstruction>,
    pub fee_payer: Pubkey,
    pub freshness: FreshnessToken,
}

impl TransactionDraft {
    fn compile(&self) -> Result<SolTransaction> {
        Ok(SolTransaction::compile(
            &self.instructions,
            &self.fee_payer,
            &self.freshness.blockhash,
        )?)
    }
}

#[instrument(skip_all, fields(kind = ?operation.kind, target = %operation.target))]
pub async fn submit(
    rpc: &dyn LedgerRpc,
    signer: &dyn TransactionSigner,
    operation: PreparedOperation,
) -> Result<OperationReceipt> {
    let PreparedOperation {
        instructions,
        extra_signers,
        target,
        ..
    } = operation;

    let freshness = rpc.get_latest_blockhash().await?;
    debug!(
        last_valid_block_height = freshness.last_valid_block_height,
        "fetched freshness token"
    );

    let draft = TransactionDraft {
        instructions,
        fee_payer: signer.pubkey(),
        freshness,
    };
    let mut tx = draft.compile()?;

    for keypair in &extra_signers {
        tx.partial_sign(keypair)?;
    }
    drop(extra_signers);

    let signed = sign_with(signer, tx).await?;
    let signature = signed
        .signature()
        .ok_or_else(|| TokenError::SigningRejected("fee payer signature is missing".into()))?;
    let wire = signed.to_wire()?;

    let sent = rpc
        .send_transaction(&wire)
        .await
        .map_err(|e| TokenError::BroadcastFailed(e.to_string()))?;
    if sent != signature {
        warn!(%sent, expected = %signature, "node reported a different signature");
    }
    info!(%signature, "transaction broadcast, awaiting confirmation");

    match rpc.confirm_transaction(&signature, &draft.freshness).await {
        Ok(ConfirmationOutcome::Confirmed) => {
            info!(%signature, "transaction confirmed");
            Ok(OperationReceipt {
                signature,
                address: target,
            })
        }
        Ok(ConfirmationOutcome::Failed(reason)) => {
            Err(TokenError::TransactionFailed { signature, reason })
        }
        Ok(ConfirmationOutcome::Expired) => Err(TokenError::ConfirmationTimeout {
            signature,
            reason: format!(
                "block height exceeded {}",
                draft.freshness.last_valid_block_height
            ),
        }),
        Err(e) => Err(TokenError::ConfirmationTimeout {
            signature,
            reason: e.to_string(),
        }),
    }
}

/// Step 4. The signer may only add signatures: a changed message or any
/// missing or invalid signature counts as a rejection.
async fn sign_with(signer: &dyn TransactionSigner, tx: SolTransaction) -> Result<SolTransaction> {
    let expected = tx.message.clone();

    let signed = signer
        .sign_transaction(tx)
        .await
        .map_err(|e| TokenError::SigningRejected(e.to_string()))?;

    if signed.message != expected {
        return Err(TokenError::SigningRejected(
            "signer returned a different transaction".into(),
        ));
    }
    signed
        .verify_signatures()
        .map_err(|e| TokenError::SigningRejected(e.to_string()))?;

    Ok(signed)
}
