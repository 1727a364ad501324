//! In-memory `LedgerRpc` shared by the integration tests.
//!
//! Records every call by method name so tests can assert what was (and was
//! not) asked of the ledger.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use sol_chain::{Keypair, Pubkey, SolInstruction, SolTransaction};
use token_core::rpc::{
    ConfirmationOutcome, ExecutionStatus, FreshnessToken, InstructionKind, LedgerRpc, MintInfo,
    ParsedInstruction, ParsedTransaction, RpcError, SignatureInfo, TokenAccountState,
};

pub const RENT_EXEMPT_MINT: u64 = 1_461_600;

pub const FRESHNESS: FreshnessToken = FreshnessToken {
    blockhash: [42u8; 32],
    last_valid_block_height: 1_000,
};

#[derive(Default)]
struct State {
    mints: HashMap<Pubkey, MintInfo>,
    token_accounts: HashMap<Pubkey, TokenAccountState>,
    token_account_failures: HashMap<Pubkey, RpcError>,
    balances: HashMap<Pubkey, u64>,
    signatures: Vec<SignatureInfo>,
    transactions: HashMap<String, ParsedTransaction>,
    signature_list_failures: VecDeque<RpcError>,
    transaction_failures: HashMap<String, RpcError>,
    send_error: Option<RpcError>,
    confirm_result: Option<Result<ConfirmationOutcome, RpcError>>,
    calls: Vec<String>,
    sent: Vec<Vec<u8>>,
    confirmed_with: Vec<FreshnessToken>,
}

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<State>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    fn record(&self, call: &str) {
        self.with(|s| s.calls.push(call.to_string()));
    }

    // -- setup ---------------------------------------------------------------

    pub fn add_mint(&self, mint: Pubkey, decimals: u8, authority: Option<Pubkey>) {
        self.with(|s| {
            s.mints.insert(
                mint,
                MintInfo {
                    address: mint,
                    decimals,
                    mint_authority: authority,
                    freeze_authority: authority,
                    supply: 0,
                },
            )
        });
    }

    pub fn add_token_account(&self, address: Pubkey, mint: Pubkey, owner: Pubkey, amount: u64) {
        self.with(|s| {
            s.token_accounts.insert(
                address,
                TokenAccountState {
                    address,
                    mint,
                    owner,
                    amount,
                },
            )
        });
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.with(|s| s.balances.insert(owner, lamports));
    }

    /// Append to the signature list (most recent first) with its body.
    pub fn add_history(&self, tx: ParsedTransaction) {
        let listed_at = tx.block_time;
        self.add_history_listed_at(tx, listed_at);
    }

    /// As `add_history`, but the signature list reports its own block time.
    pub fn add_history_listed_at(&self, tx: ParsedTransaction, listed_at: Option<i64>) {
        self.with(|s| {
            s.signatures.push(SignatureInfo {
                signature: tx.signature.clone(),
                block_time: listed_at,
            });
            s.transactions.insert(tx.signature.clone(), tx);
        });
    }

    /// A signature-list entry whose body the node does not know.
    pub fn add_unknown_signature(&self, signature: &str) {
        self.with(|s| {
            s.signatures.push(SignatureInfo {
                signature: signature.to_string(),
                block_time: None,
            })
        });
    }

    /// Reads of `address` fail with `error` instead of answering.
    pub fn fail_token_account(&self, address: Pubkey, error: RpcError) {
        self.with(|s| s.token_account_failures.insert(address, error));
    }

    pub fn fail_signature_list(&self, errors: impl IntoIterator<Item = RpcError>) {
        self.with(|s| s.signature_list_failures.extend(errors));
    }

    pub fn fail_transaction(&self, signature: &str, error: RpcError) {
        self.with(|s| s.transaction_failures.insert(signature.to_string(), error));
    }

    pub fn fail_send(&self, error: RpcError) {
        self.with(|s| s.send_error = Some(error));
    }

    pub fn set_confirmation(&self, result: Result<ConfirmationOutcome, RpcError>) {
        self.with(|s| s.confirm_result = Some(result));
    }

    // -- inspection ----------------------------------------------------------

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn count(&self, method: &str) -> usize {
        self.with(|s| s.calls.iter().filter(|c| *c == method).count())
    }

    /// Transactions handed to `send_transaction`, decoded.
    pub fn sent(&self) -> Vec<SolTransaction> {
        self.with(|s| {
            s.sent
                .iter()
                .map(|wire| SolTransaction::from_wire(wire).unwrap())
                .collect()
        })
    }

    /// Instructions of the single transaction that was sent.
    pub fn sent_instructions(&self) -> Vec<SolInstruction> {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one broadcast");
        sent[0].decompile_instructions().unwrap()
    }

    pub fn confirmed_with(&self) -> Vec<FreshnessToken> {
        self.with(|s| s.confirmed_with.clone())
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    async fn get_latest_blockhash(&self) -> Result<FreshnessToken, RpcError> {
        self.record("get_latest_blockhash");
        Ok(FRESHNESS)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        _data_len: usize,
    ) -> Result<u64, RpcError> {
        self.record("get_minimum_balance_for_rent_exemption");
        Ok(RENT_EXEMPT_MINT)
    }

    async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, RpcError> {
        self.record("get_mint");
        self.with(|s| s.mints.get(mint).cloned())
            .ok_or_else(|| RpcError::AccountNotFound(mint.to_string()))
    }

    async fn get_token_account(&self, address: &Pubkey) -> Result<TokenAccountState, RpcError> {
        self.record("get_token_account");
        self.with(|s| {
            if let Some(e) = s.token_account_failures.get(address) {
                return Err(e.clone());
            }
            s.token_accounts
                .get(address)
                .cloned()
                .ok_or_else(|| RpcError::AccountNotFound(address.to_string()))
        })
    }

    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, RpcError> {
        self.record("get_balance");
        Ok(self.with(|s| s.balances.get(owner).copied().unwrap_or(0)))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccountState>, RpcError> {
        self.record("get_token_accounts_by_owner");
        let mut accounts: Vec<_> = self.with(|s| {
            s.token_accounts
                .values()
                .filter(|a| a.owner == *owner)
                .cloned()
                .collect()
        });
        accounts.sort_by_key(|a| a.address.to_bytes());
        Ok(accounts)
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError> {
        self.record("send_transaction");
        self.with(|s| {
            s.sent.push(wire.to_vec());
            match &s.send_error {
                Some(e) => Err(e.clone()),
                None => Ok(SolTransaction::from_wire(wire)
                    .ok()
                    .and_then(|tx| tx.signature())
                    .unwrap_or_default()),
            }
        })
    }

    async fn confirm_transaction(
        &self,
        _signature: &str,
        freshness: &FreshnessToken,
    ) -> Result<ConfirmationOutcome, RpcError> {
        self.record("confirm_transaction");
        self.with(|s| {
            s.confirmed_with.push(*freshness);
            s.confirm_result
                .clone()
                .unwrap_or(Ok(ConfirmationOutcome::Confirmed))
        })
    }

    async fn get_signatures_for_address(
        &self,
        _address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        self.record("get_signatures_for_address");
        self.with(|s| match s.signature_list_failures.pop_front() {
            Some(e) => Err(e),
            None => Ok(s.signatures.iter().take(limit).cloned().collect()),
        })
    }

    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, RpcError> {
        self.record("get_parsed_transaction");
        self.with(|s| match s.transaction_failures.get(signature) {
            Some(e) => Err(e.clone()),
            None => Ok(s.transactions.get(signature).cloned()),
        })
    }
}

// -- fixtures ----------------------------------------------------------------

pub fn keypair(seed: u8) -> Keypair {
    Keypair::from_seed(&[seed; 32])
}

pub fn key(byte: u8) -> Pubkey {
    Pubkey::new([byte; 32])
}

pub fn token_ix(kind: InstructionKind) -> ParsedInstruction {
    ParsedInstruction {
        program_id: sol_chain::TOKEN_PROGRAM_ID,
        kind,
    }
}

pub fn parsed_tx(
    signature: &str,
    block_time: Option<i64>,
    status: ExecutionStatus,
    instructions: Vec<ParsedInstruction>,
) -> ParsedTransaction {
    ParsedTransaction {
        signature: signature.to_string(),
        block_time,
        status,
        instructions,
    }
}
