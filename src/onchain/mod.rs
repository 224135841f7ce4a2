//! On-chain access for the prediction market on Monad testnet.
//!
//! The contract is an external collaborator reached over JSON-RPC; nothing
//! here writes to it. The pieces:
//! - `abi`: pinned event topic / function selectors and word-level codecs
//! - `ledger`: the `LedgerReader` seam plus the HTTP RPC implementation
//! - `activity`: the paginated `BetPlaced` scan that rebuilds recent bets
//! - `types`: decoded events and the watcher's channel signals
//!
//! The activity fetcher is generic over `LedgerReader`, so the scan logic is
//! exercised in tests against a scripted in-memory ledger.

pub mod abi;
pub mod activity;
pub mod ledger;
pub mod types;

pub use activity::{ActivityFetcher, ActivityScan, QueryWindow};
pub use ledger::{BlockRange, LedgerError, LedgerReader, RpcLedger};
pub use types::{ActivityEvent, BetEvent, Choice};
