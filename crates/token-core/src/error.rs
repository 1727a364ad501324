use sol_chain::SolError;
use thiserror::Error;

use crate::rpc::RpcError;

/// Every failure an operation can surface to the presentation layer.
///
/// Variants are ordered roughly by when they can occur: validation happens
/// before any network call, signing before any write, broadcast and
/// confirmation last.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("you are not the mint authority for {mint}; only the mint authority can mint new tokens")]
    NotMintAuthority { mint: String },

    #[error("insufficient balance: you have {held} tokens but are trying to send {requested} tokens")]
    InsufficientBalance {
        held: String,
        requested: String,
        held_raw: u64,
        requested_raw: u64,
    },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("invalid token mint {mint}: {reason}")]
    InvalidMint { mint: String, reason: String },

    #[error("transaction was not signed: {0}")]
    SigningRejected(String),

    #[error("transaction broadcast failed: {0}; restart the operation to try again")]
    BroadcastFailed(String),

    #[error("transaction {signature} was not confirmed before its blockhash expired ({reason}); check its status before retrying")]
    ConfirmationTimeout { signature: String, reason: String },

    #[error("transaction {signature} failed on chain: {reason}")]
    TransactionFailed { signature: String, reason: String },

    #[error("rate limited by the RPC endpoint, gave up after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: RpcError },

    #[error("network error: {0}")]
    Network(RpcError),

    #[error(transparent)]
    Chain(#[from] SolError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Reads outside the retry controller are single attempts, so every RPC
/// failure that reaches `?` is a network error, rate limiting included.
impl From<RpcError> for TokenError {
    fn from(e: RpcError) -> Self {
        TokenError::Network(e)
    }
}

pub type Result<T> = std::result::Result<T, TokenError>;
