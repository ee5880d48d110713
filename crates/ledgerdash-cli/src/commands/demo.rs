//! `ledgerdash demo`
//!
//! Scripted session: an admin connects, mints, manages the whitelist, removes
//! an asset, and disconnects. Each step prints the resulting snapshot.

use super::resolve_config;
use anyhow::{Context, Result};
use ledgerdash_app::{DashboardController, DashboardSnapshot, MintRequest, MutationReceipt, MutationError};
use ledgerdash_testkit::{alice, bob, carol, seed_standard, test_config, InMemoryLedger};
use std::path::Path;
use std::sync::Arc;

/// Run the scripted session.
pub async fn run(path: Option<&Path>, json: bool) -> Result<()> {
    let config = match path {
        Some(_) => resolve_config(path)?,
        None => test_config(),
    };
    let ledger = Arc::new(InMemoryLedger::new(&config));
    seed_standard(&ledger);
    ledger.seed_asset(&alice(), "Sprout");

    let controller = DashboardController::new(config, ledger.clone())
        .context("building dashboard controller")?;

    controller.connect(alice()).await;
    print_step("connect admin", &controller.snapshot(), json)?;

    let minted = controller
        .mint(MintRequest::new("Fern", "https://example.invalid/fern.png", "A green fern"))
        .await;
    report(&minted);
    print_step("mint", &controller.snapshot(), json)?;

    report(&controller.grant_access(carol().as_str(), "Carol").await);
    print_step("grant access", &controller.snapshot(), json)?;

    report(&controller.revoke_access(bob().as_str()).await);
    print_step("revoke access", &controller.snapshot(), json)?;

    if let Some(asset) = ledger.assets_of(&alice()).first() {
        report(&controller.remove_asset(asset.as_str()).await);
        print_step("remove asset", &controller.snapshot(), json)?;
    }

    controller.toggle_view().await;
    print_step("toggle view", &controller.snapshot(), json)?;

    controller.disconnect();
    print_step("disconnect", &controller.snapshot(), json)?;
    Ok(())
}

fn report(result: &Result<MutationReceipt, MutationError>) {
    match result {
        Ok(receipt) => println!("  ✓ {} (digest {})", receipt.message, receipt.digest),
        Err(err) => println!("  ✗ {} [{}]", err.user_message(), err.category()),
    }
}

fn print_step(step: &str, snapshot: &DashboardSnapshot, json: bool) -> Result<()> {
    println!("== {step}");
    println!("  {}", snapshot.standing_label());
    println!("  {}", snapshot.balance_label());
    println!(
        "  view {:?}: {} assets, {} whitelisted",
        snapshot.view,
        snapshot.assets.len(),
        snapshot.access_list.len()
    );
    for asset in &snapshot.assets {
        println!("    {} {} [{}] {}", asset.object_id, asset.name, asset.status, asset.price);
    }
    for entry in snapshot.access_list.iter() {
        println!("    {} {}", entry.address, entry.name);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    }
    Ok(())
}
