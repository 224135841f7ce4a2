//! Owner-side treasury sweep.
//!
//! Pulls excess funds out of the prediction market contract via
//! handleExcessFunds("withdraw"). What counts as excess (balance not owed
//! to winning bettors) is the contract's call, not this tool's.
//!
//! Requires BIRDY_OWNER_KEY in the environment (or .env).
//!
//! Usage:
//!   cargo run --bin withdraw

use anyhow::Result;
use std::io::{self, Write};

use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;

use birdymarket::config::{require_env, Config};
use birdymarket::contract::{ExcessAction, MarketContract};
use birdymarket::feed::{format_mon, short_address};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let config = Config::bootstrap()?;
    let market = config.chain.market()?;

    let key = require_env("BIRDY_OWNER_KEY")?;
    let signer: PrivateKeySigner = key.parse()?;
    let owner = signer.address();
    let wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(config.chain.rpc_url.parse()?);

    println!("=== Treasury Sweep ===");
    let held = provider.get_balance(market).await?;
    let owner_before = provider.get_balance(owner).await?;
    println!("Contract: {}  |  holds {} MON", market, format_mon(held));
    println!(
        "Owner:    {}  |  holds {} MON",
        short_address(&owner),
        format_mon(owner_before),
    );

    print!("Submit handleExcessFunds(\"withdraw\")? [y/N]: ");
    io::stdout().flush()?;
    let mut confirm = String::new();
    io::stdin().read_line(&mut confirm)?;
    if !confirm.trim().eq_ignore_ascii_case("y") {
        println!("Aborted.");
        return Ok(());
    }

    let contract = MarketContract::new(provider.clone(), market);
    let tx = contract.handle_excess_funds(ExcessAction::Withdraw).await?;
    println!("  OK  sweep submitted — tx: {tx}");

    let held_after = provider.get_balance(market).await?;
    let owner_after = provider.get_balance(owner).await?;
    println!(
        "Contract now holds {} MON; owner holds {} MON.",
        format_mon(held_after),
        format_mon(owner_after),
    );

    Ok(())
}
