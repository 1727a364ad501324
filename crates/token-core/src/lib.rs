//! SPL token orchestration.
//!
//! Creates tokens, mints supply, transfers units, and reads balances and
//! history. Every operation takes its collaborators explicitly: a
//! `&dyn LedgerRpc` for the ledger and, for writes, a
//! `&dyn TransactionSigner` that pays fees and holds authority.
//!
//! ```text
//! write:  sequencer (ata, amount) -> pipeline -> OperationReceipt | TokenError
//! read:   backoff(signature list) -> backoff(body) -> classifier -> Vec<TransactionRecord>
//! ```

pub mod amount;
pub mod ata;
pub mod backoff;
pub mod balances;
pub mod classifier;
pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod json_rpc;
pub mod logging;
pub mod pipeline;
pub mod rpc;
pub mod sequencer;
pub mod signer;

pub use backoff::{classify_failure, FailureClass, RetryController, RetryPolicy};
pub use balances::{format_sol, TokenBalance};
pub use classifier::{RecordKind, TransactionRecord};
pub use config::{Cluster, Commitment, TokenConfig};
pub use error::{Result, TokenError};
pub use generation::{Generation, RequestGenerations};
pub use json_rpc::JsonRpcClient;
pub use pipeline::OperationReceipt;
pub use rpc::{LedgerRpc, RpcError};
pub use sequencer::{CreateTokenRequest, MintRequest, TransferRequest};
pub use signer::{KeypairSigner, SignerError, TransactionSigner};

use sol_chain::Pubkey;
use tracing::{info, instrument};

/// Create a new mint with the signer as mint authority. The receipt's
/// address is the new mint.
#[instrument(skip(rpc, signer), fields(payer = %signer.pubkey()))]
pub async fn create_token(
    rpc: &dyn LedgerRpc,
    signer: &dyn TransactionSigner,
    request: &CreateTokenRequest,
) -> Result<OperationReceipt> {
    let operation = sequencer::prepare_create_token(rpc, &signer.pubkey(), request).await?;
    let receipt = pipeline::submit(rpc, signer, operation).await?;
    info!(mint = %receipt.address, signature = %receipt.signature, "token created");
    Ok(receipt)
}

/// Mint supply to the receiver's associated account (the signer's when no
/// receiver is given).
#[instrument(skip(rpc, signer), fields(payer = %signer.pubkey()))]
pub async fn mint_tokens(
    rpc: &dyn LedgerRpc,
    signer: &dyn TransactionSigner,
    request: &MintRequest,
) -> Result<OperationReceipt> {
    let operation = sequencer::prepare_mint(rpc, &signer.pubkey(), request).await?;
    let receipt = pipeline::submit(rpc, signer, operation).await?;
    info!(account = %receipt.address, signature = %receipt.signature, "tokens minted");
    Ok(receipt)
}

/// Move units from the signer's associated account to the recipient's.
#[instrument(skip(rpc, signer), fields(payer = %signer.pubkey()))]
pub async fn transfer_tokens(
    rpc: &dyn LedgerRpc,
    signer: &dyn TransactionSigner,
    request: &TransferRequest,
) -> Result<OperationReceipt> {
    let operation = sequencer::prepare_transfer(rpc, &signer.pubkey(), request).await?;
    let receipt = pipeline::submit(rpc, signer, operation).await?;
    info!(account = %receipt.address, signature = %receipt.signature, "tokens transferred");
    Ok(receipt)
}

/// Classified recent history for `owner`, most recent first.
pub async fn recent_transactions(
    rpc: &dyn LedgerRpc,
    owner: &Pubkey,
    config: &TokenConfig,
) -> Result<Vec<TransactionRecord>> {
    history::recent_transactions(rpc, owner, config.history_limit, config).await
}

pub async fn token_balances(rpc: &dyn LedgerRpc, owner: &Pubkey) -> Result<Vec<TokenBalance>> {
    balances::token_balances(rpc, owner).await
}

/// Native balance in lamports.
pub async fn sol_balance(rpc: &dyn LedgerRpc, owner: &Pubkey) -> Result<u64> {
    balances::sol_balance(rpc, owner).await
}
