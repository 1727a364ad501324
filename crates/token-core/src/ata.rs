//! Associated token account resolution.
//!
//! The address is a pure function of (mint, owner). Whether the account
//! exists is asked of the ledger on every call; nothing is cached.

use sol_chain::{
    build_create_associated_token_account, derive_associated_token_address, Pubkey, SolInstruction,
};
use tracing::debug;

use crate::error::Result;
use crate::rpc::{LedgerRpc, RpcError};

/// The associated token account for `owner`'s holdings of `mint`.
pub fn derive(mint: &Pubkey, owner: &Pubkey) -> Result<Pubkey> {
    Ok(derive_associated_token_address(owner, mint)?)
}

/// One read. A missing account is `false`; any other failure propagates.
pub async fn exists(rpc: &dyn LedgerRpc, address: &Pubkey) -> Result<bool> {
    match rpc.get_token_account(address).await {
        Ok(_) => Ok(true),
        Err(RpcError::AccountNotFound(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// The create instruction for `owner`'s associated account, or `None` when it
/// already exists. Returns the derived address either way.
pub async fn ensure_create_instruction(
    rpc: &dyn LedgerRpc,
    mint: &Pubkey,
    owner: &Pubkey,
    payer: &Pubkey,
) -> Result<(Pubkey, Option<SolInstruction>)> {
    let address = derive(mint, owner)?;
    if exists(rpc, &address).await? {
        debug!(%address, %owner, "associated token account exists");
        return Ok((address, None));
    }

    debug!(%address, %owner, "associated token account missing, will create");
    Ok((
        address,
        Some(build_create_associated_token_account(payer, &address, owner, mint)),
    ))
}
