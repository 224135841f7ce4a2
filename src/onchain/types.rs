//! On-chain event types produced by the activity scanner.

use crate::onchain::abi::{self, AbiError};

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use std::fmt;
use std::str::FromStr;

/// A binary market side. Serialized on the wire as the contract's
/// `"yes"` / `"no"` vote strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    /// The exact string the contract stores and emits.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl FromStr for Choice {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("yes") {
            Ok(Self::Yes)
        } else if s.eq_ignore_ascii_case("no") {
            Ok(Self::No)
        } else {
            Err(AbiError::UnknownVote(s.to_string()))
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad so table columns can width-format a vote
        f.pad(self.as_wire())
    }
}

/// A decoded `BetPlaced` event, pinned to its position in the ledger.
/// Immutable once emitted; `(block_number, log_index)` orders events exactly
/// as the chain emitted them.
#[derive(Debug, Clone)]
pub struct BetEvent {
    pub actor: Address,
    pub market_id: u64,
    pub choice: Choice,
    /// Stake in wei (MON has 18 decimals).
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u64,
    pub tx_hash: B256,
}

impl BetEvent {
    /// Decode a raw log as `BetPlaced(address indexed user, uint256
    /// predictionId, string vote, uint256 amount)`.
    ///
    /// The actor sits in topic 1; the data head is three words (id, vote
    /// offset, amount) with the vote string in the tail. Logs that do not
    /// carry a block position cannot be ordered and are rejected.
    pub fn decode(log: &Log) -> Result<Self, AbiError> {
        let topic0 = log.topic0().ok_or(AbiError::MissingTopic(0))?;
        if *topic0 != abi::BET_PLACED_TOPIC {
            return Err(AbiError::WrongEvent(*topic0));
        }

        let actor_topic = log
            .topics()
            .get(1)
            .copied()
            .ok_or(AbiError::MissingTopic(1))?;
        let actor = Address::from_slice(&actor_topic.0[12..]);

        let data = &log.data().data;
        if data.len() < 96 {
            return Err(AbiError::ShortData(data.len()));
        }
        let market_id = abi::read_u64(data, 0)?;
        let choice = abi::read_string(data, 1)?.parse::<Choice>()?;
        let amount = abi::read_u256(data, 2)?;

        let block_number = log.block_number.ok_or(AbiError::MissingPosition)?;
        let log_index = log.log_index.ok_or(AbiError::MissingPosition)?;

        Ok(Self {
            actor,
            market_id,
            choice,
            amount,
            block_number,
            log_index,
            tx_hash: log.transaction_hash.unwrap_or_default(),
        })
    }

    /// Ledger position, used for ordering and the watcher's seen-cursor.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

impl fmt::Display for BetEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BetPlaced(market={}, {}, {} MON, block={})",
            self.market_id,
            self.choice,
            format_ether(self.amount),
            self.block_number
        )
    }
}

/// Signals emitted by the activity poll task, consumed by the main event loop.
#[derive(Debug, Clone)]
pub enum ActivityEvent {
    /// A bet newer than the last seen cursor appeared in the scan window.
    NewBet(BetEvent),

    /// A whole scan failed; the next tick retries from scratch.
    ScanFailed { reason: String },
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewBet(event) => write!(f, "NewBet({event})"),
            Self::ScanFailed { reason } => write!(f, "ScanFailed({reason})"),
        }
    }
}
