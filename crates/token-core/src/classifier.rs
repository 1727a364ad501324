//! History classification.
//!
//! Raw instructions are resolved into `InstructionKind` once, when the
//! transaction is fetched (`resolve_instruction`). Classification then only
//! looks at the tagged values.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sol_chain::{Pubkey, TOKEN_PROGRAM_ID};

use crate::rpc::{ExecutionStatus, InstructionKind, ParsedTransaction};

/// Token identity used when the matched instruction names no mint.
pub const UNKNOWN_MINT: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Create,
    Mint,
    Transfer,
    Unknown,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Create => "create",
            RecordKind::Mint => "mint",
            RecordKind::Transfer => "transfer",
            RecordKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub signature: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub kind: RecordKind,
    pub mint: String,
}

/// Resolve a `jsonParsed` instruction (`{"type": ..., "info": {...}}`).
///
/// Anything outside the token program, or a token instruction this module
/// does not track, is `Other`.
pub fn resolve_instruction(program_id: &Pubkey, parsed: Option<&Value>) -> InstructionKind {
    if *program_id != TOKEN_PROGRAM_ID {
        return InstructionKind::Other;
    }
    let Some(parsed) = parsed else {
        return InstructionKind::Other;
    };

    let mint = parsed
        .get("info")
        .and_then(|info| info.get("mint"))
        .and_then(Value::as_str)
        .map(str::to_string);

    match parsed.get("type").and_then(Value::as_str) {
        Some("initializeMint" | "initializeMint2") => InstructionKind::InitializeMint { mint },
        Some("mintTo" | "mintToChecked") => InstructionKind::MintTo { mint },
        Some("transfer" | "transferChecked") => InstructionKind::Transfer { mint },
        _ => InstructionKind::Other,
    }
}

/// Classify a fetched transaction.
///
/// Failed transactions, and transactions without status metadata, yield
/// `None` and are left out of history. `now` stands in for a missing block
/// time.
pub fn classify(tx: &ParsedTransaction, now: i64) -> Option<TransactionRecord> {
    if tx.status != ExecutionStatus::Succeeded {
        return None;
    }

    let (kind, mint) = match_kind(tx);
    Some(TransactionRecord {
        signature: tx.signature.clone(),
        timestamp: tx.block_time.unwrap_or(now),
        kind,
        mint: mint.unwrap_or_else(|| UNKNOWN_MINT.to_string()),
    })
}

fn match_kind(tx: &ParsedTransaction) -> (RecordKind, Option<String>) {
    let touches_token_program = tx
        .instructions
        .iter()
        .any(|ix| ix.program_id == TOKEN_PROGRAM_ID);
    if !touches_token_program {
        return (RecordKind::Unknown, None);
    }

    let kinds = || tx.instructions.iter().map(|ix| &ix.kind);

    if let Some(mint) = kinds().find_map(|k| match k {
        InstructionKind::MintTo { mint } => Some(mint.clone()),
        _ => None,
    }) {
        return (RecordKind::Mint, mint);
    }
    if let Some(mint) = kinds().find_map(|k| match k {
        InstructionKind::Transfer { mint } => Some(mint.clone()),
        _ => None,
    }) {
        return (RecordKind::Transfer, mint);
    }
    if let Some(mint) = kinds().find_map(|k| match k {
        InstructionKind::InitializeMint { mint } => Some(mint.clone()),
        _ => None,
    }) {
        return (RecordKind::Create, mint);
    }

    (RecordKind::Unknown, None)
}
