//! Recent transaction history for an address.
//!
//! The signature list and each transaction body are fetched under the retry
//! controller. Bodies are fetched strictly one at a time with a fixed pause
//! before each, so steady-state traffic stays under public rate limits. A
//! body that cannot be fetched or classified is skipped; the rest of the list
//! is still returned, in signature-list order (most recent first).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use sol_chain::Pubkey;
use tracing::{debug, info, instrument, warn};

use crate::backoff::RetryController;
use crate::classifier::{classify, TransactionRecord};
use crate::config::TokenConfig;
use crate::error::Result;
use crate::rpc::LedgerRpc;

/// Fetch and classify up to `limit` recent transactions touching `owner`.
#[instrument(skip(rpc, config))]
pub async fn recent_transactions(
    rpc: &dyn LedgerRpc,
    owner: &Pubkey,
    limit: usize,
    config: &TokenConfig,
) -> Result<Vec<TransactionRecord>> {
    let mut retry = RetryController::new(config.retry.clone());
    fetch_history(rpc, owner, limit, config.history_item_delay(), &mut retry).await
}

/// `recent_transactions` with an explicit controller and pause.
pub async fn fetch_history<R: Rng + Send>(
    rpc: &dyn LedgerRpc,
    owner: &Pubkey,
    limit: usize,
    item_delay: Duration,
    retry: &mut RetryController<R>,
) -> Result<Vec<TransactionRecord>> {
    let signatures = retry
        .run("getSignaturesForAddress", || {
            rpc.get_signatures_for_address(owner, limit)
        })
        .await?;
    info!(%owner, count = signatures.len(), "fetched signature list");

    let mut records = Vec::with_capacity(signatures.len());
    for entry in signatures {
        tokio::time::sleep(item_delay).await;

        let fetched = retry
            .run("getTransaction", || rpc.get_parsed_transaction(&entry.signature))
            .await;

        let mut tx = match fetched {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                warn!(signature = %entry.signature, "transaction not found, skipping");
                continue;
            }
            Err(error) => {
                warn!(signature = %entry.signature, %error, "failed to fetch transaction, skipping");
                continue;
            }
        };

        // the signature list's time wins; the body's is the fallback
        tx.block_time = entry.block_time.or(tx.block_time);

        match classify(&tx, unix_now()) {
            Some(record) => {
                debug!(signature = %record.signature, kind = ?record.kind, mint = %record.mint, "classified");
                records.push(record);
            }
            None => debug!(signature = %entry.signature, status = ?tx.status, "dropping unsuccessful transaction"),
        }
    }

    Ok(records)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
