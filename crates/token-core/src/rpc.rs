//! The ledger RPC collaborator.
//!
//! Operations never talk to the network directly; they receive a
//! `&dyn LedgerRpc` handle. `JsonRpcClient` is the production implementation,
//! tests substitute an in-memory ledger.

use async_trait::async_trait;
use serde::Serialize;
use sol_chain::Pubkey;
use thiserror::Error;


/// Failures reported by a `LedgerRpc` implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),
}

/// A recent blockhash and the last block height at which a transaction
/// referencing it can still land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessToken {
    pub blockhash: [u8; 32],
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintInfo {
    pub address: Pubkey,
    pub decimals: u8,
    pub mint_authority: Option<Pubkey>,
    pub freeze_authority: Option<Pubkey>,
    pub supply: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAccountState {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Reached the requested commitment without error.
    Confirmed,
    /// Landed, but execution failed.
    Failed(String),
    /// The blockhash expired before the transaction was seen.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: String,
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Succeeded,
    Failed(String),
    /// The node returned the transaction without status metadata.
    Unknown,
}

/// The finite set of instruction shapes history classification understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    InitializeMint { mint: Option<String> },
    MintTo { mint: Option<String> },
    Transfer { mint: Option<String> },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    pub program_id: Pubkey,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub signature: String,
    pub block_time: Option<i64>,
    pub status: ExecutionStatus,
    pub instructions: Vec<ParsedInstruction>,
}

/// Read and write access to the ledger.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<FreshnessToken, RpcError>;

    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize)
        -> Result<u64, RpcError>;

    /// Fetch and decode a mint. A missing account is `RpcError::AccountNotFound`.
    async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, RpcError>;

    /// Fetch and decode a token account. A missing account is
    /// `RpcError::AccountNotFound`.
    async fn get_token_account(&self, address: &Pubkey) -> Result<TokenAccountState, RpcError>;

    /// Native balance in lamports.
    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, RpcError>;

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccountState>, RpcError>;

    /// Submit a signed wire-format transaction, returning its signature.
    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError>;

    /// Wait for `signature` to land, bounded by the token's block height.
    async fn confirm_transaction(
        &self,
        signature: &str,
        freshness: &FreshnessToken,
    ) -> Result<ConfirmationOutcome, RpcError>;

    /// Most recent first.
    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError>;

    /// `Ok(None)` when the node does not know the signature.
    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, RpcError>;
}
