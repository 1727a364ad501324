//! Native and token balances for an owner.

use serde::Serialize;
use sol_chain::Pubkey;
use tracing::instrument;

use crate::amount;
use crate::error::Result;
use crate::rpc::LedgerRpc;
use crate::sequencer::fetch_mint;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub mint: Pubkey,
    pub account: Pubkey,
    pub raw_amount: u64,
    pub decimals: u8,
    /// `raw_amount` formatted at the mint's precision.
    pub amount: String,
}

/// Native balance in lamports.
pub async fn sol_balance(rpc: &dyn LedgerRpc, owner: &Pubkey) -> Result<u64> {
    Ok(rpc.get_balance(owner).await?)
}

/// Lamports as SOL, rounded to four fractional digits.
pub fn format_sol(lamports: u64) -> String {
    let per_sol = LAMPORTS_PER_SOL as u128;
    let ten_thousandths = (lamports as u128 * 10_000 + per_sol / 2) / per_sol;
    format!("{}.{:04}", ten_thousandths / 10_000, ten_thousandths % 10_000)
}

/// Every non-zero token holding of `owner`. Each mint is read fresh for its
/// decimals.
#[instrument(skip(rpc))]
pub async fn token_balances(rpc: &dyn LedgerRpc, owner: &Pubkey) -> Result<Vec<TokenBalance>> {
    let accounts = rpc.get_token_accounts_by_owner(owner).await?;

    let mut balances = Vec::new();
    for account in accounts.into_iter().filter(|a| a.amount > 0) {
        let mint = fetch_mint(rpc, &account.mint).await?;
        balances.push(TokenBalance {
            mint: account.mint,
            account: account.address,
            raw_amount: account.amount,
            decimals: mint.decimals,
            amount: amount::to_decimal(account.amount, mint.decimals),
        });
    }
    Ok(balances)
}
