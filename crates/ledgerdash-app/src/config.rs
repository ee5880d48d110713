//! # Application Configuration
//!
//! Deployment identifiers are resolved once at startup, either from the
//! environment or from a TOML file. A missing or malformed identifier is a
//! [`ConfigError`] surfaced to the operator; nothing downstream re-validates.

use crate::ids::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable holding the deployed package identifier.
pub const ENV_PACKAGE_ID: &str = "LEDGERDASH_PACKAGE_ID";
/// Environment variable holding the whitelist collection identifier.
pub const ENV_WHITELIST_ID: &str = "LEDGERDASH_WHITELIST_ID";
/// Environment variable selecting the network.
pub const ENV_NETWORK: &str = "LEDGERDASH_NETWORK";
/// Environment variable overriding the write gas budget.
pub const ENV_GAS_BUDGET: &str = "LEDGERDASH_GAS_BUDGET";
/// Environment variable overriding the paid-mint price.
pub const ENV_MINT_PRICE: &str = "LEDGERDASH_MINT_PRICE";

/// MIST per whole SUI.
pub const MIST_PER_SUI: u64 = 1_000_000_000;
/// Gas budget ceiling applied to budgeted writes.
pub const DEFAULT_GAS_BUDGET: u64 = 100_000_000;
/// Price of a paid mint (2 SUI).
pub const DEFAULT_MINT_PRICE: u64 = 2 * MIST_PER_SUI;

/// Move module that hosts the asset and whitelist entry points.
pub const MODULE_NAME: &str = "test_NFT";
/// Struct name of mintable assets.
pub const ASSET_STRUCT: &str = "NFT";
/// Struct name of the administrative capability.
pub const CAPABILITY_STRUCT: &str = "WhitelistInfo";

/// Configuration errors. These are startup failures, never runtime conditions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was absent
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    /// A setting was present but malformed
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// Setting name
        key: &'static str,
        /// What was wrong with it
        reason: String,
    },
    /// The config file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The config file was not valid TOML for [`AppConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Ledger network the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Development network
    #[default]
    Devnet,
    /// Public test network
    Testnet,
    /// Production network
    Mainnet,
    /// Locally hosted node
    Localnet,
}

impl Network {
    /// Full-node RPC endpoint for this network.
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Self::Devnet => "https://fullnode.devnet.sui.io:443",
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Self::Localnet => "http://127.0.0.1:9000",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
            Self::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            "localnet" => Ok(Self::Localnet),
            other => Err(format!("unknown network `{other}`")),
        }
    }
}

fn default_gas_budget() -> u64 {
    DEFAULT_GAS_BUDGET
}

fn default_mint_price() -> u64 {
    DEFAULT_MINT_PRICE
}

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployed package that defines the asset and whitelist module
    pub package_id: ObjectId,

    /// Shared whitelist collection object
    pub whitelist_id: ObjectId,

    /// Network selection
    #[serde(default)]
    pub network: Network,

    /// Gas budget ceiling for budgeted writes (MIST)
    #[serde(default = "default_gas_budget")]
    pub gas_budget: u64,

    /// Payment split from gas for a paid mint (MIST)
    #[serde(default = "default_mint_price")]
    pub mint_price: u64,
}

impl AppConfig {
    /// Create a configuration with default network, budget, and price.
    pub fn new(package_id: ObjectId, whitelist_id: ObjectId) -> Self {
        Self {
            package_id,
            whitelist_id,
            network: Network::default(),
            gas_budget: DEFAULT_GAS_BUDGET,
            mint_price: DEFAULT_MINT_PRICE,
        }
    }

    /// Resolve configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required_id = |key: &'static str| -> Result<ObjectId, ConfigError> {
            let raw = lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))?;
            ObjectId::parse(&raw).map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            })
        };

        let mut config = Self::new(required_id(ENV_PACKAGE_ID)?, required_id(ENV_WHITELIST_ID)?);

        if let Some(raw) = lookup(ENV_NETWORK) {
            config.network = raw
                .parse()
                .map_err(|reason| ConfigError::Invalid {
                    key: ENV_NETWORK,
                    reason,
                })?;
        }
        if let Some(raw) = lookup(ENV_GAS_BUDGET) {
            config.gas_budget = parse_mist(ENV_GAS_BUDGET, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MINT_PRICE) {
            config.mint_price = parse_mist(ENV_MINT_PRICE, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gas_budget == 0 {
            return Err(ConfigError::Invalid {
                key: "gas_budget",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.mint_price == 0 {
            return Err(ConfigError::Invalid {
                key: "mint_price",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.package_id == self.whitelist_id {
            return Err(ConfigError::Invalid {
                key: "whitelist_id",
                reason: "must differ from the package id".to_string(),
            });
        }
        Ok(())
    }

    /// Fully qualified type of mintable assets.
    pub fn asset_type(&self) -> String {
        format!("{}::{MODULE_NAME}::{ASSET_STRUCT}", self.package_id)
    }

    /// Fully qualified type of the administrative capability.
    pub fn capability_type(&self) -> String {
        format!("{}::{MODULE_NAME}::{CAPABILITY_STRUCT}", self.package_id)
    }
}

fn parse_mist(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .replace('_', "")
        .parse::<u64>()
        .map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn lookup_resolves_required_ids() {
        let config = AppConfig::from_lookup(env(&[
            (ENV_PACKAGE_ID, "0xFACE"),
            (ENV_WHITELIST_ID, "0x1157"),
        ]))
        .unwrap();

        assert_eq!(config.package_id.as_str(), "0xface");
        assert_eq!(config.network, Network::Devnet);
        assert_eq!(config.gas_budget, DEFAULT_GAS_BUDGET);
        assert_eq!(config.mint_price, 2_000_000_000);
        assert_eq!(config.asset_type(), "0xface::test_NFT::NFT");
        assert_eq!(config.capability_type(), "0xface::test_NFT::WhitelistInfo");
    }

    #[test]
    fn lookup_reports_missing_and_malformed_ids() {
        let missing = AppConfig::from_lookup(env(&[(ENV_PACKAGE_ID, "0x1")]));
        assert!(matches!(missing, Err(ConfigError::Missing(ENV_WHITELIST_ID))));

        let blank = AppConfig::from_lookup(env(&[(ENV_PACKAGE_ID, "  "), (ENV_WHITELIST_ID, "0x2")]));
        assert!(matches!(blank, Err(ConfigError::Missing(ENV_PACKAGE_ID))));

        let malformed =
            AppConfig::from_lookup(env(&[(ENV_PACKAGE_ID, "package"), (ENV_WHITELIST_ID, "0x2")]));
        assert!(matches!(
            malformed,
            Err(ConfigError::Invalid {
                key: ENV_PACKAGE_ID,
                ..
            })
        ));
    }

    #[test]
    fn lookup_applies_overrides() {
        let config = AppConfig::from_lookup(env(&[
            (ENV_PACKAGE_ID, "0x1"),
            (ENV_WHITELIST_ID, "0x2"),
            (ENV_NETWORK, "Testnet"),
            (ENV_GAS_BUDGET, "50_000_000"),
            (ENV_MINT_PRICE, "1000"),
        ]))
        .unwrap();

        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.gas_budget, 50_000_000);
        assert_eq!(config.mint_price, 1000);

        let bad_network = AppConfig::from_lookup(env(&[
            (ENV_PACKAGE_ID, "0x1"),
            (ENV_WHITELIST_ID, "0x2"),
            (ENV_NETWORK, "moonnet"),
        ]));
        assert!(matches!(
            bad_network,
            Err(ConfigError::Invalid { key: ENV_NETWORK, .. })
        ));
    }

    #[test]
    fn toml_uses_defaults_for_optional_fields() {
        let config = AppConfig::from_toml_str(
            r#"
            package_id = "0xabc"
            whitelist_id = "0xdef"
            network = "localnet"
            "#,
        )
        .unwrap();

        assert_eq!(config.network, Network::Localnet);
        assert_eq!(config.network.fullnode_url(), "http://127.0.0.1:9000");
        assert_eq!(config.gas_budget, DEFAULT_GAS_BUDGET);
    }

    #[test]
    fn toml_rejects_bad_identifiers() {
        let result = AppConfig::from_toml_str(
            r#"
            package_id = "abc"
            whitelist_id = "0xdef"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut config = AppConfig::new(ObjectId::parse("0x1").unwrap(), ObjectId::parse("0x2").unwrap());
        config.gas_budget = 0;
        assert!(config.validate().is_err());

        let same = AppConfig::new(ObjectId::parse("0x1").unwrap(), ObjectId::parse("0x1").unwrap());
        assert!(same.validate().is_err());
    }
}
