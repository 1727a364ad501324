//! History retrieval: ordering, pacing, backoff and per-item failures.

mod common;

use std::time::Duration;

use common::{key, parsed_tx, token_ix, MockLedger};
use rand::rngs::StdRng;
use rand::SeedableRng;
use token_core::history::fetch_history;
use token_core::rpc::{ExecutionStatus, InstructionKind, RpcError};
use token_core::{RecordKind, RetryController, RetryPolicy, TokenConfig, TokenError};
use tokio::time::Instant;

const ITEM_DELAY: Duration = Duration::from_millis(300);

fn controller() -> RetryController<StdRng> {
    RetryController::with_rng(RetryPolicy::default(), StdRng::seed_from_u64(11))
}

fn mint_to(mint: &str) -> InstructionKind {
    InstructionKind::MintTo {
        mint: Some(mint.to_string()),
    }
}

fn rate_limited() -> RpcError {
    RpcError::Http {
        status: 429,
        message: "Too Many Requests".into(),
    }
}

#[tokio::test(start_paused = true)]
async fn records_keep_signature_list_order_and_drop_failures() {
    let ledger = MockLedger::new();
    ledger.add_history(parsed_tx(
        "newest",
        Some(300),
        ExecutionStatus::Succeeded,
        vec![token_ix(mint_to("M1"))],
    ));
    ledger.add_history(parsed_tx(
        "failed",
        Some(200),
        ExecutionStatus::Failed("InstructionError".into()),
        vec![token_ix(mint_to("M2"))],
    ));
    ledger.add_history(parsed_tx(
        "oldest",
        Some(100),
        ExecutionStatus::Succeeded,
        vec![token_ix(InstructionKind::Transfer { mint: None })],
    ));

    let records = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap();

    let signatures: Vec<&str> = records.iter().map(|r| r.signature.as_str()).collect();
    assert_eq!(signatures, ["newest", "oldest"]);
    assert_eq!(records[0].kind, RecordKind::Mint);
    assert_eq!(records[0].mint, "M1");
    assert_eq!(records[0].timestamp, 300);
    assert_eq!(records[1].kind, RecordKind::Transfer);
    assert_eq!(records[1].mint, "unknown");
}

#[tokio::test(start_paused = true)]
async fn bodies_are_fetched_one_at_a_time_with_fixed_pause() {
    let ledger = MockLedger::new();
    for sig in ["a", "b", "c"] {
        ledger.add_history(parsed_tx(sig, Some(1), ExecutionStatus::Succeeded, vec![]));
    }
    let started = Instant::now();

    let records = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.kind == RecordKind::Unknown));
    assert!(started.elapsed() >= ITEM_DELAY * 3);
    assert_eq!(
        ledger.calls(),
        [
            "get_signatures_for_address",
            "get_parsed_transaction",
            "get_parsed_transaction",
            "get_parsed_transaction",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn per_item_failures_are_skipped() {
    let ledger = MockLedger::new();
    ledger.add_history(parsed_tx("ok-1", Some(3), ExecutionStatus::Succeeded, vec![]));
    ledger.add_history(parsed_tx("broken", Some(2), ExecutionStatus::Succeeded, vec![]));
    ledger.add_unknown_signature("vanished");
    ledger.add_history(parsed_tx("status-less", Some(1), ExecutionStatus::Unknown, vec![]));
    ledger.add_history(parsed_tx("ok-2", Some(0), ExecutionStatus::Succeeded, vec![]));
    ledger.fail_transaction("broken", RpcError::InvalidResponse("garbled".into()));

    let records = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap();

    let signatures: Vec<&str> = records.iter().map(|r| r.signature.as_str()).collect();
    assert_eq!(signatures, ["ok-1", "ok-2"]);
}

#[tokio::test(start_paused = true)]
async fn signature_list_recovers_after_rate_limiting() {
    let ledger = MockLedger::new();
    ledger.add_history(parsed_tx("only", Some(5), ExecutionStatus::Succeeded, vec![]));
    ledger.fail_signature_list([rate_limited(), RpcError::Timeout("slow".into())]);

    let records = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(ledger.count("get_signatures_for_address"), 3);
}

#[tokio::test(start_paused = true)]
async fn signature_list_gives_up_after_five_retries() {
    let ledger = MockLedger::new();
    ledger.fail_signature_list(std::iter::repeat_with(rate_limited).take(10));

    let err = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::RetryExhausted { attempts: 6, .. }));
    assert_eq!(ledger.count("get_signatures_for_address"), 6);
    assert_eq!(ledger.count("get_parsed_transaction"), 0);
}

#[tokio::test(start_paused = true)]
async fn fatal_signature_list_error_propagates_immediately() {
    let ledger = MockLedger::new();
    ledger.fail_signature_list([RpcError::Http {
        status: 500,
        message: "internal".into(),
    }]);

    let err = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap_err();

    assert!(matches!(err, TokenError::Network(_)));
    assert_eq!(ledger.count("get_signatures_for_address"), 1);
}

#[tokio::test(start_paused = true)]
async fn limit_is_passed_to_the_signature_list() {
    let ledger = MockLedger::new();
    for i in 0..5 {
        let signature = format!("s{i}");
        ledger.add_history(parsed_tx(&signature, Some(i), ExecutionStatus::Succeeded, vec![]));
    }

    let records = fetch_history(&ledger, &key(1), 2, ITEM_DELAY, &mut controller())
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn signature_list_time_is_preferred_over_body_time() {
    let ledger = MockLedger::new();
    ledger.add_history_listed_at(
        parsed_tx("listed", Some(500), ExecutionStatus::Succeeded, vec![]),
        Some(400),
    );
    ledger.add_history_listed_at(
        parsed_tx("body-only", Some(300), ExecutionStatus::Succeeded, vec![]),
        None,
    );

    let records = fetch_history(&ledger, &key(1), 10, ITEM_DELAY, &mut controller())
        .await
        .unwrap();

    assert_eq!(records[0].timestamp, 400);
    assert_eq!(records[1].timestamp, 300);
}

#[tokio::test(start_paused = true)]
async fn missing_block_time_falls_back_to_now() {
    let ledger = MockLedger::new();
    ledger.add_history(parsed_tx("undated", None, ExecutionStatus::Succeeded, vec![]));

    let config = TokenConfig::default();
    let records = token_core::recent_transactions(&ledger, &key(1), &config)
        .await
        .unwrap();

    // 2023-11-14; any real clock is later
    assert!(records[0].timestamp > 1_700_000_000);
}
