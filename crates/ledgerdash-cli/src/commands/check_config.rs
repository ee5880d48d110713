//! `ledgerdash check-config`

use super::resolve_config;
use anyhow::Result;
use ledgerdash_app::views::format_sui;
use std::path::Path;

/// Validate configuration and print what the dashboard would use.
pub fn run(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    tracing::info!(network = %config.network, "Configuration valid");

    println!("package:         {}", config.package_id);
    println!("whitelist:       {}", config.whitelist_id);
    println!("network:         {} ({})", config.network, config.network.fullnode_url());
    println!("asset type:      {}", config.asset_type());
    println!("capability type: {}", config.capability_type());
    println!("gas budget:      {} MIST", config.gas_budget);
    println!("mint price:      {}", format_sui(config.mint_price));
    Ok(())
}
