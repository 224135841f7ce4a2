use birdymarket::catalog::{Catalog, TallyBoard};
use birdymarket::config::Config;
use birdymarket::contract::{MarketContract, ResolutionEvent};
use birdymarket::feed::{self, TickerFeed};
use birdymarket::onchain::{ActivityEvent, ActivityFetcher, QueryWindow, RpcLedger};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = if Path::new("birdymarket.toml").exists() {
        Config::load(Path::new("birdymarket.toml"))?
    } else {
        Config::from_env()
    };

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    info!("birdymarket v{} starting", env!("CARGO_PKG_VERSION"));

    // --- Market Catalog ---
    let catalog = match &config.catalog.file {
        Some(path) => Catalog::load(Path::new(path))?,
        None => Catalog::builtin(),
    };
    info!(
        markets = catalog.len(),
        categories = catalog.categories().len(),
        "market catalog ready"
    );
    let catalog = Arc::new(Mutex::new(catalog));

    // --- Chain Connection ---
    let ledger = RpcLedger::connect(&config.chain.rpc_url, &config.chain.fallback_rpc_urls).await?;
    let market = config.chain.market()?;
    let contract = MarketContract::new(ledger.provider(), market);
    info!(
        market = %market,
        chain_id = config.chain.chain_id,
        "watching prediction market"
    );

    // --- Activity Scanner ---
    let (activity_tx, mut activity_rx) = mpsc::unbounded_channel::<ActivityEvent>();
    let window = QueryWindow {
        max_span: config.activity.max_span,
        lookback: config.activity.lookback,
    };
    let fetcher = ActivityFetcher::new(ledger, market, window);
    let recent_limit = config.activity.recent_limit;
    let scan_interval = Duration::from_secs(config.activity.scan_interval_secs);
    tokio::spawn(async move {
        // Consecutive scans overlap; only events past the cursor are forwarded.
        let mut cursor: Option<(u64, u64)> = None;
        let mut interval = tokio::time::interval(scan_interval);
        loop {
            interval.tick().await;
            match fetcher.recent_bets(recent_limit).await {
                Ok(scan) => {
                    if scan.skipped > 0 {
                        warn!(skipped = scan.skipped, "dropped undecodable activity entries");
                    }
                    for event in scan.events {
                        if cursor.map_or(true, |seen| event.position() > seen) {
                            cursor = Some(event.position());
                            let _ = activity_tx.send(ActivityEvent::NewBet(event));
                        }
                    }
                }
                Err(e) => {
                    let _ = activity_tx.send(ActivityEvent::ScanFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    });
    info!(
        max_span = config.activity.max_span,
        lookback = config.activity.lookback,
        limit = recent_limit,
        interval_secs = config.activity.scan_interval_secs,
        "activity scanner started"
    );

    // --- Resolution Poller ---
    let (resolution_tx, mut resolution_rx) = mpsc::unbounded_channel::<ResolutionEvent>();
    let resolution_enabled = config.resolution.enabled;
    let poll_interval = Duration::from_secs(config.resolution.poll_interval_secs);
    let catalog_for_poll = catalog.clone();
    tokio::spawn(async move {
        if !resolution_enabled {
            info!("resolution poller disabled (set resolution.enabled=true in config)");
            return;
        }
        info!(
            interval_secs = poll_interval.as_secs(),
            "resolution poller started"
        );
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            let pending = catalog_for_poll.lock().await.unresolved_ids();
            for id in pending {
                match contract.predictions(id).await {
                    Ok(state) if state.resolved => match state.result {
                        Some(result) => {
                            let _ = resolution_tx.send(ResolutionEvent::Resolved {
                                market_id: id,
                                result,
                            });
                        }
                        None => warn!(market_id = id, "resolved without a recorded result"),
                    },
                    Ok(_) => {}
                    Err(e) => {
                        let _ = resolution_tx.send(ResolutionEvent::PollFailed {
                            reason: e.to_string(),
                        });
                        // endpoint is struggling, finish the rest next tick
                        break;
                    }
                }
            }
        }
    });

    // --- Spot Price Feed ---
    if config.feeds.enabled {
        let pairs = catalog.lock().await.trading_pairs();
        if pairs.is_empty() {
            info!("no ticker-backed markets in catalog, spot feed idle");
        } else {
            info!(pairs = pairs.len(), "spot price feed enabled");
            let ticker = TickerFeed::new(config.feeds.base_url.clone());
            let feed_interval = Duration::from_secs(config.feeds.poll_interval_secs);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(feed_interval);
                loop {
                    interval.tick().await;
                    for quote in ticker.spot_all(&pairs).await {
                        info!(symbol = %quote.symbol, price = %quote.price, "spot price");
                    }
                }
            });
        }
    } else {
        info!("spot price feed disabled (set feeds.enabled=true in config)");
    }

    // --- Main Event Loop ---
    let tallies = TallyBoard::new();
    info!("entering watch loop - press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(event) = activity_rx.recv() => {
                match event {
                    ActivityEvent::NewBet(bet) => {
                        tallies.apply(&bet);
                        let title = {
                            let catalog = catalog.lock().await;
                            catalog.get(bet.market_id).map(|m| m.title.clone())
                        };
                        info!(
                            block = bet.block_number,
                            tx = %bet.tx_hash,
                            "{}",
                            feed::marquee_line(&bet, title.as_deref())
                        );
                        if let Some(tally) = tallies.get(bet.market_id) {
                            debug!(
                                market_id = bet.market_id,
                                yes_pct = %tally.yes_percent(),
                                bets = tally.bets,
                                "tally updated"
                            );
                        }
                    }
                    ActivityEvent::ScanFailed { reason } => {
                        warn!(reason = %reason, "activity scan failed, retrying next tick");
                    }
                }
            }

            Some(event) = resolution_rx.recv() => {
                match event {
                    ResolutionEvent::Resolved { market_id, result } => {
                        let listed = catalog.lock().await.mark_resolved(market_id);
                        info!(market_id, result = %result, listed, "market resolved");
                    }
                    ResolutionEvent::PollFailed { reason } => {
                        warn!(reason = %reason, "resolution poll failed");
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down...");
                break;
            }
        }
    }

    info!(markets_with_bets = tallies.markets_seen(), "watcher stopped");
    Ok(())
}
