//! Runtime configuration.
//!
//! One ledger network per process, chosen at startup. Values come from the
//! environment (after `.env` is loaded) or from a JSON file; anything not set
//! keeps its default.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::RetryPolicy;
use crate::error::{Result, TokenError};

/// A Solana cluster, or an explicit RPC URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Custom(url) => url,
        }
    }
}

impl FromStr for Cluster {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Cluster::Custom(url.to_string()))
            }
            other => Err(TokenError::Config(format!(
                "unknown cluster {other:?}; expected devnet, testnet, mainnet-beta or an http(s) URL"
            ))),
        }
    }
}

impl TryFrom<String> for Cluster {
    type Error = TokenError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Cluster> for String {
    fn from(c: Cluster) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::Devnet => f.write_str("devnet"),
            Cluster::Testnet => f.write_str("testnet"),
            Cluster::MainnetBeta => f.write_str("mainnet-beta"),
            Cluster::Custom(url) => f.write_str(url),
        }
    }
}

/// How settled a transaction must be before it counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl FromStr for Commitment {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(TokenError::Config(format!("unknown commitment {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub cluster: Cluster,
    pub commitment: Commitment,
    /// Signatures requested per history fetch.
    pub history_limit: usize,
    /// Fixed pause before each transaction body fetch.
    pub history_item_delay_ms: u64,
    pub confirm_poll_interval_ms: u64,
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
}

/// Upper bound on configured retries; each one can wait up to `max_delay_ms`.
const MAX_RETRIES: u32 = 20;

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            commitment: Commitment::default(),
            history_limit: 10,
            history_item_delay_ms: 300,
            confirm_poll_interval_ms: 500,
            request_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl TokenConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    ///
    /// `SOLANA_RPC_URL` overrides `SOLANA_CLUSTER` when both are set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(cluster) = lookup("SOLANA_CLUSTER") {
            config.cluster = cluster.parse()?;
        }
        if let Some(url) = lookup("SOLANA_RPC_URL") {
            config.cluster = url.parse()?;
        }
        if let Some(commitment) = lookup("SOLANA_COMMITMENT") {
            config.commitment = commitment.parse()?;
        }
        if let Some(v) = lookup("TOKEN_HISTORY_LIMIT") {
            config.history_limit = parse_number("TOKEN_HISTORY_LIMIT", &v)?;
        }
        if let Some(v) = lookup("TOKEN_HISTORY_DELAY_MS") {
            config.history_item_delay_ms = parse_number("TOKEN_HISTORY_DELAY_MS", &v)?;
        }
        if let Some(v) = lookup("TOKEN_CONFIRM_POLL_MS") {
            config.confirm_poll_interval_ms = parse_number("TOKEN_CONFIRM_POLL_MS", &v)?;
        }
        if let Some(v) = lookup("TOKEN_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("TOKEN_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("TOKEN_RETRY_MAX") {
            config.retry.max_retries = parse_number("TOKEN_RETRY_MAX", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TokenError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TokenError::Config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 || self.history_limit > 1_000 {
            return Err(TokenError::Config(format!(
                "history_limit must be between 1 and 1000, got {}",
                self.history_limit
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(TokenError::Config("request_timeout_secs must be positive".into()));
        }
        if self.retry.max_retries > MAX_RETRIES {
            return Err(TokenError::Config(format!(
                "retry max_retries must be at most {MAX_RETRIES}, got {}",
                self.retry.max_retries
            )));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(TokenError::Config(format!(
                "retry multiplier must be at least 1.0, got {}",
                self.retry.multiplier
            )));
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> &str {
        self.cluster.url()
    }

    pub fn history_item_delay(&self) -> Duration {
        Duration::from_millis(self.history_item_delay_ms)
    }

    pub fn confirm_poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| TokenError::Config(format!("{key}={value:?}: {e}")))
}
