//! Reusable test fixtures
//!
//! Well-known identities, a deterministic configuration, and a harness that
//! wires a [`DashboardController`] to an [`InMemoryLedger`].

use crate::ledger::InMemoryLedger;
use ledgerdash_app::{Address, AppConfig, DashboardController, ObjectId};
use std::sync::Arc;

/// Starting balance given to funded fixture accounts (10 SUI).
pub const STARTING_BALANCE: u64 = 10_000_000_000;

/// Configuration pointing at the simulated package.
pub fn test_config() -> AppConfig {
    AppConfig::new(
        ObjectId::parse("0xbeef").unwrap(),
        ObjectId::parse("0xface").unwrap(),
    )
}

/// Administrator account.
pub fn alice() -> Address {
    Address::parse("0xa11ce").unwrap()
}

/// Regular account.
pub fn bob() -> Address {
    Address::parse("0xb0b").unwrap()
}

/// Regular account.
pub fn carol() -> Address {
    Address::parse("0xca201").unwrap()
}

/// Controller and simulated ledger sharing one configuration.
pub struct TestHarness {
    /// Simulated ledger, for seeding and assertions
    pub ledger: Arc<InMemoryLedger>,
    /// Controller under test
    pub controller: DashboardController,
}

impl TestHarness {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::with_ledger(|_| {})
    }

    /// Ledger prepared by `seed` before the controller is built.
    pub fn with_ledger(seed: impl FnOnce(&InMemoryLedger)) -> Self {
        let config = test_config();
        let ledger = Arc::new(InMemoryLedger::new(&config));
        seed(&ledger);
        let controller = DashboardController::new(config, ledger.clone()).unwrap();
        Self { ledger, controller }
    }

    /// Alice as funded admin, Bob funded and whitelisted.
    pub fn standard() -> Self {
        Self::with_ledger(seed_standard)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Funded admin Alice, funded whitelisted Bob, unfunded Carol.
pub fn seed_standard(ledger: &InMemoryLedger) {
    ledger.fund(&alice(), STARTING_BALANCE);
    ledger.grant_admin(&alice());
    ledger.fund(&bob(), STARTING_BALANCE);
    ledger.whitelist(&bob());
}
