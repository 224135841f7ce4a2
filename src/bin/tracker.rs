//! Recent Bet Tracker — one-shot scan of the prediction market's BetPlaced
//! activity over the last N blocks, printed newest-first as a table.
//!
//! Usage:
//!   cargo run --bin tracker                          # config defaults
//!   cargo run --bin tracker -- --limit 20            # newest 20 bets
//!   cargo run --bin tracker -- --lookback 5000       # wider window

use anyhow::Result;
use chrono::Utc;

use birdymarket::catalog::Catalog;
use birdymarket::config::Config;
use birdymarket::feed::{format_mon, short_address};
use birdymarket::onchain::{ActivityFetcher, QueryWindow, RpcLedger};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::bootstrap()?;
    let mut limit = config.activity.recent_limit;
    let mut lookback = config.activity.lookback;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" if i + 1 < args.len() => {
                limit = args[i + 1].parse().unwrap_or(limit);
                i += 2;
            }
            "--lookback" if i + 1 < args.len() => {
                lookback = args[i + 1].parse().unwrap_or(lookback);
                i += 2;
            }
            _ => i += 1,
        }
    }

    let catalog = match &config.catalog.file {
        Some(path) => Catalog::load(std::path::Path::new(path))?,
        None => Catalog::builtin(),
    };

    let market = config.chain.market()?;
    println!("=== Birdy Market Tracker ===");
    println!(
        "Market: {}  |  Window: last {} blocks in chunks of {}  |  Showing newest {}",
        market, lookback, config.activity.max_span, limit,
    );
    println!("Scanned at {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
    println!();

    let ledger = RpcLedger::connect(&config.chain.rpc_url, &config.chain.fallback_rpc_urls).await?;
    let fetcher = ActivityFetcher::new(
        ledger,
        market,
        QueryWindow {
            max_span: config.activity.max_span,
            lookback,
        },
    );

    let scan = fetcher.recent_bets(limit).await?;

    if scan.events.is_empty() {
        println!("No bets in the scanned window.");
    } else {
        println!(
            " {:<3} | {:<9} | {:<13} | {:<4} | {:<10} | Market",
            "#", "Block", "Bettor", "Vote", "Stake MON"
        );
        println!("{}", "-".repeat(90));

        for (i, event) in scan.events.iter().rev().enumerate() {
            let title = catalog
                .get(event.market_id)
                .map(|m| m.title.clone())
                .unwrap_or_else(|| format!("market #{}", event.market_id));
            let title_trunc = if title.len() > 40 {
                format!("{}...", &title[..37])
            } else {
                title
            };

            println!(
                " {:<3} | {:<9} | {:<13} | {:<4} | {:<10} | {}",
                i + 1,
                event.block_number,
                short_address(&event.actor),
                event.choice,
                format_mon(event.amount),
                title_trunc,
            );
        }
        println!();
        println!("{} bet(s) shown.", scan.events.len());
    }

    if scan.skipped > 0 {
        println!("Skipped {} undecodable log entries.", scan.skipped);
    }

    Ok(())
}
