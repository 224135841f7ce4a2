//! Market resolution tool: records the outcome of one prediction market
//! on-chain via resolvePrediction.
//!
//! Requires BIRDY_OWNER_KEY in the environment (or .env); the contract
//! rejects resolution from any other signer.
//!
//! Usage:
//!   cargo run --bin resolve -- <market_id> <yes|no>

use anyhow::{anyhow, bail, Result};
use std::io::{self, Write};

use alloy::network::EthereumWallet;
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;

use birdymarket::catalog::Catalog;
use birdymarket::config::{require_env, Config};
use birdymarket::contract::MarketContract;
use birdymarket::feed::short_address;
use birdymarket::onchain::Choice;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: resolve <market_id> <yes|no>");
    }
    let market_id: u64 = args[1]
        .parse()
        .map_err(|_| anyhow!("market id must be a number, got {:?}", args[1]))?;
    let result: Choice = args[2].parse()?;

    let config = Config::bootstrap()?;
    let market = config.chain.market()?;

    let key = require_env("BIRDY_OWNER_KEY")?;
    let signer: PrivateKeySigner = key.parse()?;
    let owner = signer.address();
    let wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(config.chain.rpc_url.parse()?);
    let contract = MarketContract::new(provider, market);

    let catalog = match &config.catalog.file {
        Some(path) => Catalog::load(std::path::Path::new(path))?,
        None => Catalog::builtin(),
    };

    println!("=== Market Resolution ===");
    println!(
        "Owner: {}  |  Market contract: {}",
        short_address(&owner),
        market,
    );
    match catalog.get(market_id) {
        Some(m) => println!("Resolving #{}: \"{}\" as {}", market_id, m.title, result),
        None => println!("Resolving #{} (not in catalog) as {}", market_id, result),
    }

    let current = contract.predictions(market_id).await?;
    if current.resolved {
        match current.result {
            Some(prev) => println!("Already resolved as {prev}. Nothing to do."),
            None => println!("Already resolved (no recorded result). Nothing to do."),
        }
        return Ok(());
    }

    print!("Submit resolvePrediction({market_id}, \"{result}\")? [y/N]: ");
    io::stdout().flush()?;
    let mut confirm = String::new();
    io::stdin().read_line(&mut confirm)?;
    if !confirm.trim().eq_ignore_ascii_case("y") {
        println!("Aborted.");
        return Ok(());
    }

    let tx = contract.resolve_prediction(market_id, result).await?;
    println!("  OK  resolution submitted — tx: {tx}");

    let state = contract.predictions(market_id).await?;
    match (state.resolved, state.result) {
        (true, Some(r)) => println!("Confirmed on-chain: resolved as {r}."),
        (true, None) => println!("Confirmed on-chain: resolved, result not readable."),
        _ => println!("Warning: contract still reports the market unresolved."),
    }

    Ok(())
}
