//! `LedgerRpc` over Solana's JSON-RPC HTTP API.
//!
//! Account data is requested base64-encoded and decoded with `sol-chain`'s
//! unpackers; only transaction history uses the node's `jsonParsed` view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sol_chain::{address_to_bytes, unpack_mint, unpack_token_account, Pubkey, TOKEN_PROGRAM_ID};
use tracing::{debug, trace};

use crate::classifier::resolve_instruction;
use crate::config::{Commitment, TokenConfig};
use crate::rpc::{
    ConfirmationOutcome, ExecutionStatus, FreshnessToken, LedgerRpc, MintInfo, ParsedInstruction,
    ParsedTransaction, RpcError, SignatureInfo, TokenAccountState,
};

pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    commitment: Commitment,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("url", &self.url)
            .field("commitment", &self.commitment)
            .finish()
    }
}

impl JsonRpcClient {
    /// A client for the configured cluster.
    pub fn from_config(config: &TokenConfig) -> Result<Self, RpcError> {
        Self::new(config.rpc_url(), config)
    }

    /// A client for an explicit endpoint, with the other settings from `config`.
    pub fn new(url: impl Into<String>, config: &TokenConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url: url.into(),
            commitment: config.commitment,
            poll_interval: config.confirm_poll_interval(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(%method, id, "rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("").to_string()
                } else {
                    text
                },
            });
        }

        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))?;
        if let Some(error) = envelope.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        serde_json::from_value(envelope.result)
            .map_err(|e| RpcError::InvalidResponse(format!("{method}: {e}")))
    }

    /// History endpoints reject `processed`.
    fn history_commitment(&self) -> &'static str {
        self.commitment.max(Commitment::Confirmed).as_str()
    }

    /// Raw data of a token-program-owned account.
    async fn get_token_program_account(&self, address: &Pubkey) -> Result<Vec<u8>, RpcError> {
        let result: WithContext<Option<AccountInfo>> = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        let account = result
            .value
            .ok_or_else(|| RpcError::AccountNotFound(address.to_string()))?;
        account.token_data()
    }

    async fn get_block_height(&self) -> Result<u64, RpcError> {
        self.call("getBlockHeight", json!([{ "commitment": self.commitment.as_str() }]))
            .await
    }

    async fn get_signature_status(
        &self,
        signature: &str,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        let result: WithContext<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature], { "searchTransactionHistory": false }]),
            )
            .await?;
        Ok(result.value.into_iter().next().flatten())
    }
}

#[async_trait]
impl LedgerRpc for JsonRpcClient {
    async fn get_latest_blockhash(&self) -> Result<FreshnessToken, RpcError> {
        let result: WithContext<LatestBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;

        let blockhash = address_to_bytes(&result.value.blockhash)
            .map_err(|e| RpcError::InvalidResponse(format!("blockhash: {e}")))?;
        Ok(FreshnessToken {
            blockhash,
            last_valid_block_height: result.value.last_valid_block_height,
        })
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        self.call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await
    }

    async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, RpcError> {
        let data = self.get_token_program_account(mint).await?;
        let state = unpack_mint(&data).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        Ok(MintInfo {
            address: *mint,
            decimals: state.decimals,
            mint_authority: state.mint_authority,
            freeze_authority: state.freeze_authority,
            supply: state.supply,
        })
    }

    async fn get_token_account(&self, address: &Pubkey) -> Result<TokenAccountState, RpcError> {
        let data = self.get_token_program_account(address).await?;
        token_account_state(*address, &data)
    }

    async fn get_balance(&self, owner: &Pubkey) -> Result<u64, RpcError> {
        let result: WithContext<u64> = self
            .call(
                "getBalance",
                json!([owner.to_string(), { "commitment": self.commitment.as_str() }]),
            )
            .await?;
        Ok(result.value)
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
    ) -> Result<Vec<TokenAccountState>, RpcError> {
        let result: WithContext<Vec<KeyedAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    owner.to_string(),
                    { "programId": TOKEN_PROGRAM_ID.to_string() },
                    { "encoding": "base64", "commitment": self.commitment.as_str() }
                ]),
            )
            .await?;

        result
            .value
            .into_iter()
            .map(|keyed| {
                let address = parse_pubkey(&keyed.pubkey)?;
                token_account_state(address, &keyed.account.token_data()?)
            })
            .collect()
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError> {
        self.call(
            "sendTransaction",
            json!([
                BASE64.encode(wire),
                { "encoding": "base64", "preflightCommitment": self.commitment.as_str() }
            ]),
        )
        .await
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        freshness: &FreshnessToken,
    ) -> Result<ConfirmationOutcome, RpcError> {
        loop {
            if let Some(status) = self.get_signature_status(signature).await? {
                if let Some(err) = status.err.as_ref().filter(|e| !e.is_null()) {
                    return Ok(ConfirmationOutcome::Failed(err.to_string()));
                }
                if status.reaches(self.commitment) {
                    return Ok(ConfirmationOutcome::Confirmed);
                }
            }

            let height = self.get_block_height().await?;
            if height > freshness.last_valid_block_height {
                debug!(%signature, height, last_valid = freshness.last_valid_block_height, "blockhash expired");
                return Ok(ConfirmationOutcome::Expired);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_signatures_for_address(
        &self,
        address: &Pubkey,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let entries: Vec<SignatureEntry> = self
            .call(
                "getSignaturesForAddress",
                json!([
                    address.to_string(),
                    { "limit": limit, "commitment": self.history_commitment() }
                ]),
            )
            .await?;

        Ok(entries
            .into_iter()
            .map(|e| SignatureInfo {
                signature: e.signature,
                block_time: e.block_time,
            })
            .collect())
    }

    async fn get_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ParsedTransaction>, RpcError> {
        let raw: Option<RawTransaction> = self
            .call(
                "getTransaction",
                json!([
                    signature,
                    {
                        "encoding": "jsonParsed",
                        "maxSupportedTransactionVersion": 0,
                        "commitment": self.history_commitment()
                    }
                ]),
            )
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let status = match raw.meta {
            None => ExecutionStatus::Unknown,
            Some(meta) => match meta.err {
                Some(err) if !err.is_null() => ExecutionStatus::Failed(err.to_string()),
                _ => ExecutionStatus::Succeeded,
            },
        };

        let instructions = raw
            .transaction
            .message
            .instructions
            .into_iter()
            .map(|ix| {
                let program_id = parse_pubkey(&ix.program_id)?;
                Ok(ParsedInstruction {
                    kind: resolve_instruction(&program_id, ix.parsed.as_ref()),
                    program_id,
                })
            })
            .collect::<Result<Vec<_>, RpcError>>()?;

        Ok(Some(ParsedTransaction {
            signature: signature.to_string(),
            block_time: raw.block_time,
            status,
            instructions,
        }))
    }
}

fn transport_error(e: reqwest::Error) -> RpcError {
    if e.is_timeout() {
        RpcError::Timeout(e.to_string())
    } else if let Some(status) = e.status() {
        RpcError::Http {
            status: status.as_u16(),
            message: e.to_string(),
        }
    } else {
        RpcError::Transport(e.to_string())
    }
}

fn parse_pubkey(s: &str) -> Result<Pubkey, RpcError> {
    s.parse()
        .map_err(|e| RpcError::InvalidResponse(format!("bad address {s:?}: {e}")))
}

fn token_account_state(address: Pubkey, data: &[u8]) -> Result<TokenAccountState, RpcError> {
    let state = unpack_token_account(data).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
    Ok(TokenAccountState {
        address,
        mint: state.mint,
        owner: state.owner,
        amount: state.amount,
    })
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
struct AccountInfo {
    /// `[payload, encoding]`
    data: (String, String),
    owner: String,
}

impl AccountInfo {
    fn token_data(&self) -> Result<Vec<u8>, RpcError> {
        if self.owner != TOKEN_PROGRAM_ID.to_string() {
            return Err(RpcError::InvalidResponse(format!(
                "account is owned by {}, not the token program",
                self.owner
            )));
        }
        if self.data.1 != "base64" {
            return Err(RpcError::InvalidResponse(format!(
                "unexpected account encoding {:?}",
                self.data.1
            )));
        }
        BASE64
            .decode(&self.data.0)
            .map_err(|e| RpcError::InvalidResponse(format!("account data: {e}")))
    }
}

#[derive(Deserialize)]
struct KeyedAccount {
    pubkey: String,
    account: AccountInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    confirmation_status: Option<String>,
    #[serde(default)]
    err: Option<Value>,
}

impl SignatureStatus {
    fn reaches(&self, wanted: Commitment) -> bool {
        let reached = match self.confirmation_status.as_deref() {
            Some("processed") => Commitment::Processed,
            Some("confirmed") => Commitment::Confirmed,
            Some("finalized") => Commitment::Finalized,
            _ => return false,
        };
        reached >= wanted
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureEntry {
    signature: String,
    block_time: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    block_time: Option<i64>,
    meta: Option<RawMeta>,
    transaction: RawTransactionBody,
}

#[derive(Deserialize)]
struct RawMeta {
    #[serde(default)]
    err: Option<Value>,
}

#[derive(Deserialize)]
struct RawTransactionBody {
    message: RawMessage,
}

#[derive(Deserialize)]
struct RawMessage {
    instructions: Vec<RawInstruction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInstruction {
    program_id: String,
    parsed: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::{classify_failure, FailureClass};
    use crate::rpc::InstructionKind;
    use mockito::{Matcher, Server, ServerGuard};

    fn test_config() -> TokenConfig {
        TokenConfig {
            confirm_poll_interval_ms: 5,
            request_timeout_secs: 5,
            ..TokenConfig::default()
        }
    }

    fn client(server: &ServerGuard) -> JsonRpcClient {
        JsonRpcClient::new(server.url(), &test_config()).unwrap()
    }

    fn ok(result: Value) -> String {
        json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
    }

    async fn mock_method(server: &mut ServerGuard, method: &str, body: String) -> mockito::Mock {
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    fn mint_bytes(authority: &Pubkey, supply: u64, decimals: u8) -> Vec<u8> {
        let mut data = vec![0u8; 82];
        data[0] = 1;
        data[4..36].copy_from_slice(authority.as_bytes());
        data[36..44].copy_from_slice(&supply.to_le_bytes());
        data[44] = decimals;
        data[45] = 1;
        data
    }

    fn token_account_bytes(mint: &Pubkey, owner: &Pubkey, amount: u64) -> Vec<u8> {
        let mut data = vec![0u8; 165];
        data[0..32].copy_from_slice(mint.as_bytes());
        data[32..64].copy_from_slice(owner.as_bytes());
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data[108] = 1;
        data
    }

    fn account_json(data: &[u8], owner: &Pubkey) -> Value {
        json!({
            "data": [BASE64.encode(data), "base64"],
            "executable": false,
            "lamports": 1_461_600,
            "owner": owner.to_string(),
            "rentEpoch": 0
        })
    }

    #[tokio::test]
    async fn latest_blockhash_decodes_base58() {
        let mut server = Server::new_async().await;
        let hash = Pubkey::new([7u8; 32]).to_string();
        let _m = mock_method(
            &mut server,
            "getLatestBlockhash",
            ok(json!({
                "context": { "slot": 1 },
                "value": { "blockhash": hash, "lastValidBlockHeight": 1234 }
            })),
        )
        .await;

        let token = client(&server).get_latest_blockhash().await.unwrap();
        assert_eq!(token.blockhash, [7u8; 32]);
        assert_eq!(token.last_valid_block_height, 1234);
    }

    #[tokio::test]
    async fn get_mint_unpacks_account_data() {
        let mut server = Server::new_async().await;
        let mint = Pubkey::new([1u8; 32]);
        let authority = Pubkey::new([2u8; 32]);
        let _m = mock_method(
            &mut server,
            "getAccountInfo",
            ok(json!({
                "context": { "slot": 1 },
                "value": account_json(&mint_bytes(&authority, 5_000, 6), &TOKEN_PROGRAM_ID)
            })),
        )
        .await;

        let info = client(&server).get_mint(&mint).await.unwrap();
        assert_eq!(info.address, mint);
        assert_eq!(info.decimals, 6);
        assert_eq!(info.supply, 5_000);
        assert_eq!(info.mint_authority, Some(authority));
        assert_eq!(info.freeze_authority, None);
    }

    #[tokio::test]
    async fn missing_account_is_account_not_found() {
        let mut server = Server::new_async().await;
        let _m = mock_method(
            &mut server,
            "getAccountInfo",
            ok(json!({ "context": { "slot": 1 }, "value": null })),
        )
        .await;

        let err = client(&server)
            .get_token_account(&Pubkey::new([3u8; 32]))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn account_not_owned_by_token_program_is_rejected() {
        let mut server = Server::new_async().await;
        let system_owned = Pubkey::new([0u8; 32]);
        let _m = mock_method(
            &mut server,
            "getAccountInfo",
            ok(json!({
                "context": { "slot": 1 },
                "value": account_json(&[0u8; 82], &system_owned)
            })),
        )
        .await;

        let err = client(&server).get_mint(&Pubkey::new([1u8; 32])).await.unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn token_accounts_by_owner() {
        let mut server = Server::new_async().await;
        let owner = Pubkey::new([4u8; 32]);
        let mint = Pubkey::new([5u8; 32]);
        let account = Pubkey::new([6u8; 32]);
        let _m = mock_method(
            &mut server,
            "getTokenAccountsByOwner",
            ok(json!({
                "context": { "slot": 1 },
                "value": [{
                    "pubkey": account.to_string(),
                    "account": account_json(&token_account_bytes(&mint, &owner, 42), &TOKEN_PROGRAM_ID)
                }]
            })),
        )
        .await;

        let accounts = client(&server).get_token_accounts_by_owner(&owner).await.unwrap();
        assert_eq!(
            accounts,
            vec![TokenAccountState {
                address: account,
                mint,
                owner,
                amount: 42
            }]
        );
    }

    #[tokio::test]
    async fn http_429_is_classified_as_rate_limited() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/")
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let err = client(&server).get_balance(&Pubkey::new([1u8; 32])).await.unwrap_err();
        assert_eq!(
            err,
            RpcError::Http {
                status: 429,
                message: "Too Many Requests".into()
            }
        );
        assert_eq!(classify_failure(&err), FailureClass::RateLimited);
    }

    #[tokio::test]
    async fn json_rpc_error_object_is_surfaced() {
        let mut server = Server::new_async().await;
        let _m = mock_method(
            &mut server,
            "sendTransaction",
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32002, "message": "Transaction simulation failed" }
            })
            .to_string(),
        )
        .await;

        let err = client(&server).send_transaction(&[1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, RpcError::Rpc { code: -32002, .. }));
    }

    #[tokio::test]
    async fn send_transaction_posts_base64_wire() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "method": "sendTransaction" })),
                Matcher::Regex(BASE64.encode([9u8, 8, 7])),
            ]))
            .with_status(200)
            .with_body(ok(json!("5igSig")))
            .create_async()
            .await;

        let sig = client(&server).send_transaction(&[9, 8, 7]).await.unwrap();
        assert_eq!(sig, "5igSig");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn confirm_reports_confirmed_status() {
        let mut server = Server::new_async().await;
        let _m = mock_method(
            &mut server,
            "getSignatureStatuses",
            ok(json!({
                "context": { "slot": 1 },
                "value": [{ "slot": 1, "confirmations": 0, "err": null, "confirmationStatus": "confirmed" }]
            })),
        )
        .await;

        let freshness = FreshnessToken {
            blockhash: [0u8; 32],
            last_valid_block_height: 100,
        };
        let outcome = client(&server).confirm_transaction("sig", &freshness).await.unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Confirmed);
    }

    #[tokio::test]
    async fn confirm_reports_on_chain_failure() {
        let mut server = Server::new_async().await;
        let _m = mock_method(
            &mut server,
            "getSignatureStatuses",
            ok(json!({
                "context": { "slot": 1 },
                "value": [{ "slot": 1, "err": { "InstructionError": [0, "Custom"] }, "confirmationStatus": "confirmed" }]
            })),
        )
        .await;

        let freshness = FreshnessToken {
            blockhash: [0u8; 32],
            last_valid_block_height: 100,
        };
        let outcome = client(&server).confirm_transaction("sig", &freshness).await.unwrap();
        assert!(matches!(outcome, ConfirmationOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn confirm_expires_past_last_valid_height() {
        let mut server = Server::new_async().await;
        let _statuses = mock_method(
            &mut server,
            "getSignatureStatuses",
            ok(json!({ "context": { "slot": 1 }, "value": [null] })),
        )
        .await;
        let _height = mock_method(&mut server, "getBlockHeight", ok(json!(101))).await;

        let freshness = FreshnessToken {
            blockhash: [0u8; 32],
            last_valid_block_height: 100,
        };
        let outcome = client(&server).confirm_transaction("sig", &freshness).await.unwrap();
        assert_eq!(outcome, ConfirmationOutcome::Expired);
    }

    #[tokio::test]
    async fn parsed_transaction_resolves_instructions() {
        let mut server = Server::new_async().await;
        let mint = Pubkey::new([5u8; 32]).to_string();
        let _m = mock_method(
            &mut server,
            "getTransaction",
            ok(json!({
                "blockTime": 1_700_000_000,
                "slot": 10,
                "meta": { "err": null, "fee": 5000 },
                "transaction": {
                    "signatures": ["sig"],
                    "message": {
                        "accountKeys": [],
                        "instructions": [
                            {
                                "programId": "11111111111111111111111111111111",
                                "parsed": { "type": "transfer", "info": {} },
                                "program": "system"
                            },
                            {
                                "programId": TOKEN_PROGRAM_ID.to_string(),
                                "parsed": { "type": "mintToChecked", "info": { "mint": mint } },
                                "program": "spl-token"
                            },
                            {
                                "programId": "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
                                "parsed": "hello",
                                "program": "spl-memo"
                            }
                        ]
                    }
                }
            })),
        )
        .await;

        let tx = client(&server).get_parsed_transaction("sig").await.unwrap().unwrap();
        assert_eq!(tx.status, ExecutionStatus::Succeeded);
        assert_eq!(tx.block_time, Some(1_700_000_000));
        assert_eq!(tx.instructions.len(), 3);
        assert_eq!(tx.instructions[0].kind, InstructionKind::Other);
        assert_eq!(tx.instructions[1].kind, InstructionKind::MintTo { mint: Some(mint) });
        assert_eq!(tx.instructions[2].kind, InstructionKind::Other);
    }

    #[tokio::test]
    async fn unknown_transaction_is_none() {
        let mut server = Server::new_async().await;
        let _m = mock_method(&mut server, "getTransaction", ok(Value::Null)).await;

        assert!(client(&server).get_parsed_transaction("sig").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_transaction_status() {
        let mut server = Server::new_async().await;
        let _m = mock_method(
            &mut server,
            "getTransaction",
            ok(json!({
                "blockTime": null,
                "meta": { "err": { "InstructionError": [0, { "Custom": 1 }] } },
                "transaction": { "message": { "instructions": [] } }
            })),
        )
        .await;

        let tx = client(&server).get_parsed_transaction("sig").await.unwrap().unwrap();
        assert!(matches!(tx.status, ExecutionStatus::Failed(_)));
        assert_eq!(tx.block_time, None);
    }
}
