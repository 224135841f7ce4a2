//! Market catalog and live vote tallies.
//!
//! The catalog is display metadata only: titles, categories, seeded vote
//! counts, and an optional exchange ticker per market. Bet accounting lives
//! in the contract; the tally board overlays what the activity scanner has
//! actually seen on-chain.

use crate::onchain::types::{BetEvent, Choice};

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Lifecycle of a market as shown to users. Resolved markets move to
/// `InMotion` while payouts are being claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    #[default]
    Open,
    InMotion,
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::InMotion => f.write_str("in_motion"),
        }
    }
}

/// One yes/no prediction market.
#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub id: u64,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub yes_votes: u64,
    #[serde(default)]
    pub no_votes: u64,
    #[serde(default)]
    pub status: MarketStatus,
    #[serde(default)]
    pub resolved: bool,
    /// Exchange symbol for markets that track a spot price (e.g. "UNIUSDT").
    #[serde(default)]
    pub trading_pair: Option<String>,
}

impl Market {
    pub fn total_votes(&self) -> u64 {
        self.yes_votes + self.no_votes
    }

    /// Yes share of the seeded vote counts, 0 when nobody has voted.
    pub fn seeded_yes_percent(&self) -> Decimal {
        let total = self.total_votes();
        if total == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.yes_votes) / Decimal::from(total) * Decimal::ONE_HUNDRED).round_dp(1)
    }
}

/// The market catalog: the built-in product set, or an operator-supplied
/// TOML file of the same shape.
#[derive(Debug, Clone)]
pub struct Catalog {
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    markets: Vec<Market>,
}

impl Catalog {
    /// The shipped market set: sixteen rotating base markets plus the DEFI
    /// ticker and floor-price boards.
    pub fn builtin() -> Self {
        const BASE_CATEGORIES: [&str; 4] = ["Sports", "Politics", "News", "Entertainment"];
        const SEED_YES: [u64; 16] = [
            420, 130, 910, 350, 655, 80, 540, 770, 215, 990, 460, 120, 835, 390, 605, 275,
        ];
        const SEED_NO: [u64; 16] = [
            305, 860, 145, 490, 320, 950, 610, 180, 745, 95, 530, 880, 260, 715, 405, 625,
        ];

        let mut markets: Vec<Market> = (0..16u64)
            .map(|i| Market {
                id: i + 1,
                title: format!("Prediction {}", i + 1),
                category: BASE_CATEGORIES[(i % 4) as usize].to_string(),
                yes_votes: SEED_YES[i as usize],
                no_votes: SEED_NO[i as usize],
                status: MarketStatus::Open,
                resolved: false,
                trading_pair: None,
            })
            .collect();

        let named = [
            // DEFI ticker board
            (
                29,
                "Will Uniswap ($UNI) price skyrocket to 20$ when they launch their Unichain?",
                "DEFI",
                1200,
                300,
                MarketStatus::Open,
                false,
                Some("UNIUSDT"),
            ),
            (
                30,
                "Will Ethereum (ETH) reach $4,000 by end of Q1 2025?",
                "DEFI",
                900,
                400,
                MarketStatus::Open,
                false,
                Some("ETHUSDT"),
            ),
            (
                31,
                "Will $BERA token reclaim ATH of 20$ in March?",
                "DEFI",
                900,
                400,
                MarketStatus::Open,
                false,
                Some("BERAUSDT"),
            ),
            (
                32,
                "Will $MOVE accelerate to 1$ when they announce mainnet?",
                "DEFI",
                900,
                400,
                MarketStatus::Open,
                false,
                Some("MOVEUSDT"),
            ),
            // Floor-price board
            (
                33,
                "Will BAYC floor price drop to 10 ETH by end of March?",
                "FloorPrices",
                1200,
                300,
                MarketStatus::InMotion,
                true,
                None,
            ),
            (
                34,
                "Will Milady floor price accelerate to 5 ETH by end of March?",
                "FloorPrices",
                900,
                400,
                MarketStatus::Open,
                false,
                None,
            ),
            (
                35,
                "Will Azuki Elementals flip Lil Pudgies by the end of March?",
                "FloorPrices",
                900,
                400,
                MarketStatus::Open,
                false,
                None,
            ),
            (
                36,
                "Will Kemonokakis skyrocket to 0.2 ETH first week of March?",
                "FloorPrices",
                900,
                400,
                MarketStatus::Open,
                false,
                None,
            ),
        ];

        markets.extend(named.into_iter().map(
            |(id, title, category, yes, no, status, resolved, pair)| Market {
                id,
                title: title.to_string(),
                category: category.to_string(),
                yes_votes: yes,
                no_votes: no,
                status,
                resolved,
                trading_pair: pair.map(str::to_string),
            },
        ));

        Self { markets }
    }

    /// Load a catalog from a TOML file with a `[[markets]]` table per market.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let file: CatalogFile = toml::from_str(&raw)?;
        info!(
            path = %path.display(),
            markets = file.markets.len(),
            "loaded market catalog"
        );
        Ok(Self {
            markets: file.markets,
        })
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Market> {
        self.markets.iter().find(|m| m.id == id)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for market in &self.markets {
            if !seen.iter().any(|c| c.eq_ignore_ascii_case(&market.category)) {
                seen.push(&market.category);
            }
        }
        seen
    }

    pub fn by_category(&self, category: &str) -> Vec<&Market> {
        self.markets
            .iter()
            .filter(|m| m.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Category plus case-insensitive title substring, the browse filter.
    pub fn search(&self, category: &str, term: &str) -> Vec<&Market> {
        let term = term.to_lowercase();
        self.markets
            .iter()
            .filter(|m| {
                m.category.eq_ignore_ascii_case(category)
                    && m.title.to_lowercase().contains(&term)
            })
            .collect()
    }

    /// Distinct trading pairs, for the spot-price poller.
    pub fn trading_pairs(&self) -> Vec<String> {
        let mut pairs: Vec<String> = Vec::new();
        for market in &self.markets {
            if let Some(pair) = &market.trading_pair {
                if !pairs.contains(pair) {
                    pairs.push(pair.clone());
                }
            }
        }
        pairs
    }

    /// Ids still awaiting resolution, for the resolution poller.
    pub fn unresolved_ids(&self) -> Vec<u64> {
        self.markets
            .iter()
            .filter(|m| !m.resolved)
            .map(|m| m.id)
            .collect()
    }

    /// Record an on-chain resolution. Returns false for ids not in the
    /// catalog (bets can reference markets the display set never listed).
    pub fn mark_resolved(&mut self, id: u64) -> bool {
        match self.markets.iter_mut().find(|m| m.id == id) {
            Some(market) => {
                market.resolved = true;
                market.status = MarketStatus::InMotion;
                true
            }
            None => false,
        }
    }
}

/// Running stake totals for one market, derived from scanned `BetPlaced`
/// events only. Never authoritative; the contract keeps the real books.
#[derive(Debug, Clone, Default)]
pub struct VoteTally {
    pub yes_wei: U256,
    pub no_wei: U256,
    pub bets: u64,
}

impl VoteTally {
    pub fn apply(&mut self, choice: Choice, amount: U256) {
        match choice {
            Choice::Yes => self.yes_wei += amount,
            Choice::No => self.no_wei += amount,
        }
        self.bets += 1;
    }

    pub fn total_wei(&self) -> U256 {
        self.yes_wei + self.no_wei
    }

    /// Yes share of staked value as a percentage, 0 when nothing is staked.
    pub fn yes_percent(&self) -> Decimal {
        let total = self.total_wei();
        if total == U256::ZERO {
            return Decimal::ZERO;
        }
        let yes = mon_decimal(self.yes_wei);
        let all = mon_decimal(total);
        if all == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (yes / all * Decimal::ONE_HUNDRED).round_dp(1)
    }

    pub fn no_percent(&self) -> Decimal {
        if self.total_wei() == U256::ZERO {
            return Decimal::ZERO;
        }
        (Decimal::ONE_HUNDRED - self.yes_percent()).round_dp(1)
    }
}

/// Wei to whole-MON decimal for ratio math. Stakes beyond Decimal's range
/// collapse to zero and the percentage degrades gracefully.
fn mon_decimal(wei: U256) -> Decimal {
    Decimal::from_str(&format_ether(wei)).unwrap_or(Decimal::ZERO)
}

/// Concurrent market-id → tally map shared between the scan task and
/// anything rendering percentages.
#[derive(Clone, Default)]
pub struct TallyBoard {
    inner: Arc<DashMap<u64, VoteTally>>,
}

impl TallyBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&self, event: &BetEvent) {
        self.inner
            .entry(event.market_id)
            .or_default()
            .apply(event.choice, event.amount);
    }

    pub fn get(&self, market_id: u64) -> Option<VoteTally> {
        self.inner.get(&market_id).map(|t| t.value().clone())
    }

    pub fn markets_seen(&self) -> usize {
        self.inner.len()
    }
}
