//! Spot-price quotes and activity presentation.
//!
//! Ticker-backed markets ("will ETH reach..") show the live exchange price
//! next to the question. Quotes come from Binance's public REST ticker; a
//! dead feed never blocks anything, the price column just goes stale.

use crate::onchain::types::BetEvent;

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Public Binance REST endpoint, override via config for mirrors.
pub const BINANCE_REST_BASE: &str = "https://api.binance.com";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("price request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("price endpoint returned {status} for {symbol}")]
    Status {
        symbol: String,
        status: reqwest::StatusCode,
    },
    #[error("unparseable price: {0}")]
    BadPrice(String),
}

/// One quote from the ticker endpoint.
#[derive(Debug, Clone)]
pub struct SpotPrice {
    pub symbol: String,
    pub price: Decimal,
}

impl std::fmt::Display for SpotPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.symbol, self.price)
    }
}

// Wire shape of /api/v3/ticker/price: prices arrive as strings.
#[derive(Deserialize)]
struct TickerPrice {
    symbol: String,
    price: String,
}

/// Polling client for exchange spot prices.
pub struct TickerFeed {
    base_url: String,
    client: reqwest::Client,
}

impl TickerFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn spot(&self, symbol: &str) -> Result<SpotPrice, FeedError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(FeedError::Status {
                symbol: symbol.to_string(),
                status: resp.status(),
            });
        }

        let quote: TickerPrice = resp.json().await?;
        let price = quote
            .price
            .parse::<Decimal>()
            .map_err(|_| FeedError::BadPrice(quote.price.clone()))?;

        Ok(SpotPrice {
            symbol: quote.symbol,
            price,
        })
    }

    /// Fetch every pair, dropping individual failures with a warning so one
    /// delisted symbol cannot starve the rest.
    pub async fn spot_all(&self, symbols: &[String]) -> Vec<SpotPrice> {
        let mut quotes = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match self.spot(symbol).await {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!(symbol = %symbol, error = %e, "spot price fetch failed"),
            }
        }
        quotes
    }
}

// ─── Presentation helpers ─────────────────────────────────────────────────────

/// "0x1234…abcd" form used anywhere a full address would drown the line.
pub fn short_address(addr: &Address) -> String {
    let full = format!("{addr:#x}");
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

/// Wei as whole MON with the fractional tail trimmed: 1.5 not
/// 1.500000000000000000.
pub fn format_mon(wei: U256) -> String {
    let raw = format_ether(wei);
    match raw.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => raw,
    }
}

/// One scrolling-ticker line for a bet, with the market title when the
/// catalog knows it.
pub fn marquee_line(event: &BetEvent, title: Option<&str>) -> String {
    match title {
        Some(title) => format!(
            "{} staked {} MON on {} · {}",
            short_address(&event.actor),
            format_mon(event.amount),
            event.choice,
            title
        ),
        None => format!(
            "{} staked {} MON on {} · market #{}",
            short_address(&event.actor),
            format_mon(event.amount),
            event.choice,
            event.market_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onchain::types::Choice;
    use alloy::primitives::address;
    use std::str::FromStr;

    #[test]
    fn addresses_shorten_to_head_and_tail() {
        let addr = address!("CF078031f890Ed361442e09ebA6Ec255A47d6E72");
        assert_eq!(short_address(&addr), "0xcf07…6e72");
    }

    #[test]
    fn mon_amounts_trim_trailing_zeros() {
        let one_mon = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(format_mon(one_mon), "1");
        assert_eq!(format_mon(one_mon * U256::from(10)), "10");
        assert_eq!(format_mon(one_mon / U256::from(2)), "0.5");
        assert_eq!(format_mon(U256::ZERO), "0");
        // 1 wei survives untrimmed
        assert_eq!(format_mon(U256::from(1)), "0.000000000000000001");
    }

    #[test]
    fn marquee_prefers_the_catalog_title() {
        let event = BetEvent {
            actor: address!("CF078031f890Ed361442e09ebA6Ec255A47d6E72"),
            market_id: 30,
            choice: Choice::Yes,
            amount: U256::from(10u64).pow(U256::from(18u64)) / U256::from(4),
            block_number: 5,
            log_index: 0,
            tx_hash: Default::default(),
        };

        let with_title = marquee_line(&event, Some("Will ETH reach $4,000?"));
        assert_eq!(
            with_title,
            "0xcf07…6e72 staked 0.25 MON on yes · Will ETH reach $4,000?"
        );

        let without = marquee_line(&event, None);
        assert!(without.ends_with("market #30"));
    }

    #[test]
    fn ticker_wire_prices_parse_as_decimal() {
        let raw = r#"{"symbol":"ETHUSDT","price":"2406.16000000"}"#;
        let quote: TickerPrice = serde_json::from_str(raw).unwrap();
        assert_eq!(quote.symbol, "ETHUSDT");
        assert_eq!(
            Decimal::from_str(&quote.price).unwrap(),
            Decimal::from_str("2406.16").unwrap()
        );
    }
}
