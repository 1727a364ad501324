//! Instruction sequencing for create, mint and transfer.
//!
//! Each builder validates its input, reads exactly the ledger state it needs,
//! and returns the minimal ordered instruction list for one operation. Any
//! associated account that has to be created is created by the first
//! instruction that mentions it. Nothing here signs or writes.

use serde::Deserialize;
use sol_chain::{
    build_initialize_mint, build_mint_to, build_spl_transfer, system, Keypair, Pubkey,
    SolInstruction, MINT_LEN, TOKEN_PROGRAM_ID,
};
use tracing::{debug, instrument};

use crate::amount;
use crate::ata;
use crate::error::{Result, TokenError};
use crate::rpc::{LedgerRpc, MintInfo, RpcError};

/// Largest precision accepted when creating a token.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    CreateToken,
    MintTo,
    Transfer,
}

/// An operation ready for the signing pipeline.
#[derive(Debug)]
pub struct PreparedOperation {
    pub kind: OperationKind,
    pub instructions: Vec<SolInstruction>,
    /// Key pairs that must sign before the external signer sees the
    /// transaction (the fresh mint when creating a token).
    pub extra_signers: Vec<Keypair>,
    /// The new mint, or the account that receives tokens.
    pub target: Pubkey,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTokenRequest {
    pub decimals: u8,
    /// Defaults to the payer.
    pub freeze_authority: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MintRequest {
    pub mint: String,
    pub amount: f64,
    /// Defaults to the payer.
    pub receiver: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub mint: String,
    pub recipient: String,
    pub amount: f64,
}

/// `[create_account(mint), initialize_mint(mint)]` for a freshly generated mint.
pub async fn prepare_create_token(
    rpc: &dyn LedgerRpc,
    payer: &Pubkey,
    request: &CreateTokenRequest,
) -> Result<PreparedOperation> {
    prepare_create_token_with_mint(rpc, payer, request, Keypair::generate()).await
}

/// Like `prepare_create_token`, with the mint key pair supplied by the caller.
#[instrument(skip(rpc, mint_keypair), fields(mint = %mint_keypair.pubkey()))]
pub async fn prepare_create_token_with_mint(
    rpc: &dyn LedgerRpc,
    payer: &Pubkey,
    request: &CreateTokenRequest,
    mint_keypair: Keypair,
) -> Result<PreparedOperation> {
    if request.decimals > MAX_DECIMALS {
        return Err(TokenError::Validation(format!(
            "decimals must be between 0 and {MAX_DECIMALS}, got {}",
            request.decimals
        )));
    }
    let freeze_authority =
        optional_address("freeze authority", request.freeze_authority.as_deref())?
            .unwrap_or(*payer);

    let lamports = rpc.get_minimum_balance_for_rent_exemption(MINT_LEN).await?;
    let mint = mint_keypair.pubkey();
    debug!(%mint, lamports, "rent-exempt minimum for mint account");

    let instructions = vec![
        system::create_account(payer, &mint, lamports, MINT_LEN as u64, &TOKEN_PROGRAM_ID),
        build_initialize_mint(&mint, request.decimals, payer, Some(&freeze_authority)),
    ];

    Ok(PreparedOperation {
        kind: OperationKind::CreateToken,
        instructions,
        extra_signers: vec![mint_keypair],
        target: mint,
    })
}

/// `[create_ata(receiver)?, mint_to]`. Only the mint authority may mint.
#[instrument(skip(rpc))]
pub async fn prepare_mint(
    rpc: &dyn LedgerRpc,
    payer: &Pubkey,
    request: &MintRequest,
) -> Result<PreparedOperation> {
    let mint = required_address("mint", &request.mint)?;
    let receiver = optional_address("receiver", request.receiver.as_deref())?.unwrap_or(*payer);
    require_positive(request.amount)?;

    let info = fetch_mint(rpc, &mint).await?;
    if info.mint_authority.as_ref() != Some(payer) {
        return Err(TokenError::NotMintAuthority {
            mint: mint.to_string(),
        });
    }

    let raw = amount::to_positive_raw(request.amount, info.decimals)?;
    let (destination, create) = ata::ensure_create_instruction(rpc, &mint, &receiver, payer).await?;

    let mut instructions: Vec<SolInstruction> = create.into_iter().collect();
    instructions.push(build_mint_to(&mint, &destination, payer, raw)?);

    Ok(PreparedOperation {
        kind: OperationKind::MintTo,
        instructions,
        extra_signers: Vec::new(),
        target: destination,
    })
}

/// `[create_ata(recipient)?, transfer]` from the payer's associated account.
#[instrument(skip(rpc))]
pub async fn prepare_transfer(
    rpc: &dyn LedgerRpc,
    payer: &Pubkey,
    request: &TransferRequest,
) -> Result<PreparedOperation> {
    let mint = required_address("mint", &request.mint)?;
    let recipient = required_address("recipient", &request.recipient)?;
    require_positive(request.amount)?;

    let info = fetch_mint(rpc, &mint).await?;
    let raw = amount::to_positive_raw(request.amount, info.decimals)?;

    let source = ata::derive(&mint, payer)?;
    let held = match rpc.get_token_account(&source).await {
        Ok(account) => account.amount,
        Err(RpcError::AccountNotFound(_)) => {
            return Err(TokenError::AccountNotFound(format!(
                "{payer} has no token account for mint {mint}"
            )))
        }
        Err(e) => return Err(e.into()),
    };

    if held < raw {
        return Err(TokenError::InsufficientBalance {
            held: amount::to_display(held, info.decimals),
            requested: amount::to_display(raw, info.decimals),
            held_raw: held,
            requested_raw: raw,
        });
    }

    let (destination, create) =
        ata::ensure_create_instruction(rpc, &mint, &recipient, payer).await?;

    let mut instructions: Vec<SolInstruction> = create.into_iter().collect();
    instructions.push(build_spl_transfer(&source, &destination, payer, raw)?);

    Ok(PreparedOperation {
        kind: OperationKind::Transfer,
        instructions,
        extra_signers: Vec::new(),
        target: destination,
    })
}

/// Read a mint, mapping "missing" and "not a mint" to typed errors.
pub async fn fetch_mint(rpc: &dyn LedgerRpc, mint: &Pubkey) -> Result<MintInfo> {
    match rpc.get_mint(mint).await {
        Ok(info) => Ok(info),
        Err(RpcError::AccountNotFound(_)) => {
            Err(TokenError::AccountNotFound(format!("mint {mint} does not exist")))
        }
        Err(RpcError::InvalidResponse(reason)) => Err(TokenError::InvalidMint {
            mint: mint.to_string(),
            reason,
        }),
        Err(e) => Err(e.into()),
    }
}

fn required_address(field: &str, value: &str) -> Result<Pubkey> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TokenError::Validation(format!("{field} address is required")));
    }
    value
        .parse()
        .map_err(|e| TokenError::Validation(format!("invalid {field} address: {e}")))
}

fn optional_address(field: &str, value: Option<&str>) -> Result<Option<Pubkey>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_address(field, v).map(Some),
    }
}

fn require_positive(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(TokenError::Validation(format!(
            "amount must be a positive number, got {amount}"
        )))
    }
}
