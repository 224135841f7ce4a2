//! Read-only ledger access.
//!
//! `LedgerReader` is the seam the activity fetcher is generic over: tests
//! script a ledger in memory, production uses `RpcLedger` over HTTP JSON-RPC
//! with ordered fallback endpoints probed at connect time.

use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{Filter, Log};
use alloy::transports::TransportError;
use thiserror::Error;
use tracing::{info, warn};

/// An inclusive block range, `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    /// Number of blocks covered, counting both bounds.
    pub fn span(&self) -> u64 {
        self.to - self.from + 1
    }
}

impl std::fmt::Display for BlockRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("rpc transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid RPC url {0:?}")]
    InvalidUrl(String),
    #[error("no responsive RPC endpoint among {0} candidates")]
    NoEndpoint(usize),
}

/// Read-only view of the chain. Implementations report the current tip and
/// return the logs matching a filter within an inclusive block range, in
/// emission order.
#[allow(async_fn_in_trait)]
pub trait LedgerReader {
    async fn chain_head(&self) -> Result<u64, LedgerError>;

    async fn logs(&self, filter: &Filter, range: BlockRange) -> Result<Vec<Log>, LedgerError>;
}

/// Production ledger over an HTTP JSON-RPC provider.
pub struct RpcLedger {
    provider: RootProvider,
}

impl RpcLedger {
    /// Connect to the first responsive endpoint: the configured primary, then
    /// each fallback in order. Every candidate is probed with a head-height
    /// call before being accepted.
    pub async fn connect(primary: &str, fallbacks: &[String]) -> Result<Self, LedgerError> {
        let mut candidates: Vec<&str> = Vec::new();
        if !primary.is_empty() {
            candidates.push(primary);
        }
        for url in fallbacks {
            if !url.is_empty() && candidates.iter().all(|u| *u != url.as_str()) {
                candidates.push(url);
            }
        }

        for url in &candidates {
            match Self::try_connect(url).await {
                Ok(ledger) => return Ok(ledger),
                Err(e) => warn!(url = %url, error = %e, "RPC endpoint probe failed"),
            }
        }
        Err(LedgerError::NoEndpoint(candidates.len()))
    }

    async fn try_connect(url: &str) -> Result<Self, LedgerError> {
        let parsed = url
            .parse()
            .map_err(|_| LedgerError::InvalidUrl(url.to_string()))?;
        let provider = RootProvider::new_http(parsed);
        let head = provider.get_block_number().await?;
        info!(url = %url, head = head, "connected to RPC endpoint");
        Ok(Self { provider })
    }

    /// A handle to the underlying provider; the contract client shares the
    /// same transport.
    pub fn provider(&self) -> RootProvider {
        self.provider.clone()
    }
}

impl LedgerReader for RpcLedger {
    async fn chain_head(&self) -> Result<u64, LedgerError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn logs(&self, filter: &Filter, range: BlockRange) -> Result<Vec<Log>, LedgerError> {
        let ranged = filter.clone().from_block(range.from).to_block(range.to);
        Ok(self.provider.get_logs(&ranged).await?)
    }
}
