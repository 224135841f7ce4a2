//! Birdy Market Desk — interactive terminal client for the prediction
//! market: browse the catalog, watch live stake tallies, place MON bets,
//! and claim payouts on resolved markets.
//!
//! Requires BIRDY_PRIVATE_KEY in the environment (or .env); the key signs
//! placeBet / claimPayout transactions against the configured RPC.
//!
//! Usage:
//!   cargo run --bin betdesk

use anyhow::Result;
use std::io::{self, Write};

use alloy::network::EthereumWallet;
use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;

use birdymarket::catalog::{Catalog, TallyBoard};
use birdymarket::config::{require_env, Config};
use birdymarket::contract::MarketContract;
use birdymarket::feed::{format_mon, marquee_line, short_address};
use birdymarket::onchain::{ActivityFetcher, Choice, QueryWindow, RpcLedger};
use birdymarket::view::{Action, SortFilter, ViewState};

// ─── Main ───────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::bootstrap()?;
    let market = config.chain.market()?;

    let key = require_env("BIRDY_PRIVATE_KEY")?;
    let signer: PrivateKeySigner = key.parse()?;
    let bettor = signer.address();
    let wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(config.chain.rpc_url.parse()?);

    println!("=== Birdy Market Desk ===");
    let balance = provider.get_balance(bettor).await?;
    println!(
        "Wallet: {}  |  Balance: {} MON  |  Market: {}",
        short_address(&bettor),
        format_mon(balance),
        market,
    );

    let catalog = match &config.catalog.file {
        Some(path) => Catalog::load(std::path::Path::new(path))?,
        None => Catalog::builtin(),
    };
    let contract = MarketContract::new(provider, market);

    // ─── Activity snapshot ──────────────────────────────────────────────────

    let tallies = TallyBoard::new();
    let ledger = RpcLedger::connect(&config.chain.rpc_url, &config.chain.fallback_rpc_urls).await?;
    let fetcher = ActivityFetcher::new(
        ledger,
        market,
        QueryWindow {
            max_span: config.activity.max_span,
            lookback: config.activity.lookback,
        },
    );
    match fetcher.recent_bets(config.activity.recent_limit).await {
        Ok(scan) => {
            for event in &scan.events {
                tallies.apply(event);
            }
            if !scan.events.is_empty() {
                println!();
                println!("Recent activity:");
                for event in scan.events.iter().rev().take(5) {
                    let title = catalog.get(event.market_id).map(|m| m.title.as_str());
                    println!("  {}", marquee_line(event, title));
                }
            }
            if scan.skipped > 0 {
                println!("  ({} undecodable entries skipped)", scan.skipped);
            }
        }
        Err(e) => println!("Activity scan failed ({e}); tallies start empty."),
    }

    // ─── Browse loop ────────────────────────────────────────────────────────

    let mut state = ViewState::default();
    loop {
        let rows = render_listing(&state, &catalog, &tallies);

        let input = prompt("> ")?;
        let cmd = input.trim();
        if cmd.is_empty() {
            continue;
        }
        if cmd.eq_ignore_ascii_case("q") {
            break;
        }
        if cmd.eq_ignore_ascii_case("f") {
            state.apply(Action::CycleSort);
            continue;
        }
        if cmd.eq_ignore_ascii_case("x") {
            state.apply(Action::ClearSearch);
            continue;
        }
        if let Some(rest) = cmd.strip_prefix("c ") {
            match canonical_category(&catalog, rest.trim()) {
                Some(category) => state.apply(Action::SelectCategory(category)),
                None => println!(
                    "Unknown category. Available: {}",
                    catalog.categories().join(", ")
                ),
            }
            continue;
        }
        if let Some(rest) = cmd.strip_prefix("s ") {
            state.apply(Action::SetSearch(rest.trim().to_string()));
            continue;
        }
        if let Ok(n) = cmd.parse::<usize>() {
            if n >= 1 && n <= rows.len() {
                let id = rows[n - 1];
                state.apply(Action::OpenMarket(id));
                market_screen(&contract, &catalog, &tallies, id, bettor).await?;
                state.apply(Action::Back);
                continue;
            }
        }
        println!("Invalid selection. Try again.");
    }

    Ok(())
}

// ─── Screens ────────────────────────────────────────────────────────────────

/// Print the filtered listing and return the market id behind each row.
fn render_listing(state: &ViewState, catalog: &Catalog, tallies: &TallyBoard) -> Vec<u64> {
    let markets = state.visible_markets(catalog);

    let chips: Vec<String> = SortFilter::ALL
        .iter()
        .map(|chip| {
            if *chip == state.sort {
                format!("[{chip}]")
            } else {
                chip.to_string()
            }
        })
        .collect();

    println!();
    println!(
        "Category: {}  |  Sort: {}  |  Search: {}",
        state.category,
        chips.join(" "),
        if state.search.is_empty() {
            "(none)"
        } else {
            state.search.as_str()
        },
    );

    if markets.is_empty() {
        println!("No markets match.");
    } else {
        println!(
            " {:<3} | {:<4} | {:<44} | {:<6} | {:<9} | Status",
            "#", "ID", "Market", "Yes%", "Pool MON"
        );
        println!("{}", "-".repeat(88));

        for (i, market) in markets.iter().enumerate() {
            let (yes_pct, pool) = match tallies.get(market.id) {
                Some(t) if t.bets > 0 => (t.yes_percent(), format_mon(t.total_wei())),
                _ => (market.seeded_yes_percent(), "-".to_string()),
            };
            let title_trunc = if market.title.len() > 44 {
                format!("{}...", &market.title[..41])
            } else {
                market.title.clone()
            };

            println!(
                " {:<3} | {:<4} | {:<44} | {:<6} | {:<9} | {}{}",
                i + 1,
                market.id,
                title_trunc,
                format!("{yes_pct}%"),
                pool,
                market.status,
                if market.resolved { " (resolved)" } else { "" },
            );
        }
    }

    println!();
    println!("Commands: <n> open | c <category> | s <term> | f sort | x clear | q quit");
    markets.iter().map(|m| m.id).collect()
}

/// Detail screen for one market: state, tallies, the caller's standing bet,
/// and the bet / claim flows.
async fn market_screen<P: Provider>(
    contract: &MarketContract<P>,
    catalog: &Catalog,
    tallies: &TallyBoard,
    market_id: u64,
    bettor: Address,
) -> Result<()> {
    loop {
        let Some(market) = catalog.get(market_id) else {
            println!("Market #{market_id} is not in the catalog.");
            return Ok(());
        };

        println!();
        println!("=== {} ===", market.title);
        println!(
            "Category: {}  |  Status: {}{}",
            market.category,
            market.status,
            if market.resolved { " (resolved)" } else { "" },
        );
        match tallies.get(market_id) {
            Some(t) if t.bets > 0 => println!(
                "On-chain pool: {} MON across {} bet(s)  |  yes {}% / no {}%",
                format_mon(t.total_wei()),
                t.bets,
                t.yes_percent(),
                t.no_percent(),
            ),
            _ => println!(
                "Seeded votes: yes {} / no {} ({}% yes)",
                market.yes_votes,
                market.no_votes,
                market.seeded_yes_percent(),
            ),
        }

        let resolution = contract.predictions(market_id).await?;
        if resolution.resolved {
            match resolution.result {
                Some(result) => println!("Resolved: {result}"),
                None => println!("Resolved, result not recorded."),
            }
        }

        let bet = contract.user_bets(bettor, market_id).await?;
        match bet.choice {
            Some(choice) => println!("Your bet: {} MON on {}", format_mon(bet.amount), choice),
            None => println!("You have no bet on this market."),
        }

        let claimable = if resolution.resolved {
            let claimable = contract.payout_claimable(bettor, market_id).await?;
            if claimable {
                println!(
                    "A payout looks claimable. (Eligibility is derived client-side; \
                     the contract has final say.)"
                );
            }
            claimable
        } else {
            false
        };

        if resolution.resolved {
            if claimable {
                println!("Commands: claim | b back");
            } else {
                println!("Commands: b back");
            }
        } else {
            println!("Commands: y bet yes | n bet no | b back");
        }

        let input = prompt("> ")?;
        let cmd = input.trim().to_lowercase();
        match cmd.as_str() {
            "b" => return Ok(()),
            "y" | "n" if !resolution.resolved => {
                let choice = if cmd == "y" { Choice::Yes } else { Choice::No };
                place_bet_flow(contract, market_id, choice).await?;
            }
            "claim" if resolution.resolved => {
                print!("Submit claimPayout({market_id})? [y/N]: ");
                io::stdout().flush()?;
                let mut confirm = String::new();
                io::stdin().read_line(&mut confirm)?;
                if confirm.trim().eq_ignore_ascii_case("y") {
                    match contract.claim_payout(market_id).await {
                        Ok(tx) => println!("  OK  claim submitted — tx: {tx}"),
                        Err(e) => println!("  ERR  claim failed — {e}"),
                    }
                } else {
                    println!("Aborted.");
                }
            }
            _ => println!("Invalid selection. Try again."),
        }
    }
}

async fn place_bet_flow<P: Provider>(
    contract: &MarketContract<P>,
    market_id: u64,
    choice: Choice,
) -> Result<()> {
    print!("Stake in MON (e.g. 0.25), blank to cancel: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let raw = input.trim();
    if raw.is_empty() {
        println!("Aborted.");
        return Ok(());
    }

    let stake = match parse_ether(raw) {
        Ok(v) if v > U256::ZERO => v,
        _ => {
            println!("Not a valid MON amount.");
            return Ok(());
        }
    };

    print!(
        "Bet {} MON on {} in market #{}? [y/N]: ",
        format_mon(stake),
        choice,
        market_id,
    );
    io::stdout().flush()?;
    let mut confirm = String::new();
    io::stdin().read_line(&mut confirm)?;
    if !confirm.trim().eq_ignore_ascii_case("y") {
        println!("Aborted.");
        return Ok(());
    }

    match contract.place_bet(market_id, choice, stake).await {
        Ok(tx) => println!("  OK  bet placed — tx: {tx}"),
        Err(e) => println!("  ERR  bet failed — {e}"),
    }
    Ok(())
}

// ─── Prompts ────────────────────────────────────────────────────────────────

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input)
}

fn canonical_category(catalog: &Catalog, input: &str) -> Option<String> {
    catalog
        .categories()
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(input))
        .map(str::to_string)
}
