//! # Dashboard Snapshot
//!
//! The unified view model owned by the controller. Presentation only ever sees
//! clones of it.

use super::access::AccessList;
use super::assets::{format_sui, OwnedAsset};
use crate::config::MIST_PER_SUI;
use crate::ids::{Address, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gas-coin balance in MIST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(pub u64);

impl Balance {
    /// Raw MIST value.
    pub fn mist(&self) -> u64 {
        self.0
    }

    /// Value in SUI.
    pub fn as_sui(&self) -> f64 {
        self.0 as f64 / MIST_PER_SUI as f64
    }

    /// Three-decimal display form, e.g. `"1.250 SUI"`.
    pub fn display(&self) -> String {
        format!("{:.3} SUI", self.as_sui())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Which table the dashboard is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// Owned assets
    #[default]
    Assets,
    /// Whitelist entries
    AccessList,
}

impl ViewMode {
    /// The other view.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Assets => Self::AccessList,
            Self::AccessList => Self::Assets,
        }
    }
}

/// Synchronization phase of the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPhase {
    /// No account attached; everything is empty
    #[default]
    Disconnected,
    /// Refreshes in flight. `initial` until the first full cycle lands.
    Synchronizing {
        /// Whether the identity's first full refresh is still running
        initial: bool,
    },
    /// Steady state
    Synchronized,
}

/// Unified dashboard view model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Active account, if any
    pub account: Option<Address>,
    /// Synchronization phase
    pub phase: SyncPhase,
    /// Selected table
    pub view: ViewMode,
    /// Owned assets
    pub assets: Vec<OwnedAsset>,
    /// Whitelist entries
    pub access_list: AccessList,
    /// Gas balance
    pub balance: Balance,
    /// Account passes the membership predicate
    pub is_member: bool,
    /// Account owns an administrative capability
    pub is_admin: bool,
    /// Refresh or mutation in flight
    pub loading: bool,
    /// Writes awaiting an outcome
    pub pending_mutations: usize,
}

impl DashboardSnapshot {
    /// Empty snapshot for an attached account, keeping the selected view.
    pub fn attached(account: Address, view: ViewMode) -> Self {
        Self {
            account: Some(account),
            view,
            ..Self::default()
        }
    }

    /// Whether an account is attached.
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Whether the grant and revoke controls should be offered.
    pub fn can_manage_access(&self) -> bool {
        self.is_connected() && self.is_admin
    }

    /// Asset by identifier.
    pub fn asset(&self, object_id: &ObjectId) -> Option<&OwnedAsset> {
        self.assets.iter().find(|a| &a.object_id == object_id)
    }

    /// Standing line shown next to the wallet button.
    pub fn standing_label(&self) -> String {
        if !self.is_connected() {
            return "Wallet not connected".to_string();
        }
        let mut label = if self.is_member {
            "Whitelisted".to_string()
        } else {
            "Not whitelisted".to_string()
        };
        if self.is_admin {
            label.push_str(" | Admin");
        }
        label
    }

    /// Label of the mint action for the current membership.
    pub fn mint_label(&self, mint_price: u64) -> String {
        if self.is_member {
            "Free Mint".to_string()
        } else {
            format!("Paid Mint ({})", format_sui(mint_price))
        }
    }

    /// Balance line, or the loading placeholder.
    pub fn balance_label(&self) -> String {
        if self.loading {
            "Loading...".to_string()
        } else {
            format!("Balance: {}", self.balance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_display_uses_three_decimals() {
        assert_eq!(Balance(1_250_000_000).display(), "1.250 SUI");
        assert_eq!(Balance::default().display(), "0.000 SUI");
    }

    #[test]
    fn view_toggles_back_and_forth() {
        assert_eq!(ViewMode::Assets.toggled(), ViewMode::AccessList);
        assert_eq!(ViewMode::Assets.toggled().toggled(), ViewMode::Assets);
    }

    #[test]
    fn standing_labels() {
        let mut snapshot = DashboardSnapshot::default();
        assert_eq!(snapshot.standing_label(), "Wallet not connected");
        assert!(!snapshot.can_manage_access());

        snapshot.account = Some(Address::parse("0x1").unwrap());
        assert_eq!(snapshot.standing_label(), "Not whitelisted");

        snapshot.is_member = true;
        snapshot.is_admin = true;
        assert_eq!(snapshot.standing_label(), "Whitelisted | Admin");
        assert!(snapshot.can_manage_access());
    }

    #[test]
    fn mint_label_follows_membership() {
        let mut snapshot = DashboardSnapshot::default();
        assert_eq!(snapshot.mint_label(2_000_000_000), "Paid Mint (2 SUI)");
        snapshot.is_member = true;
        assert_eq!(snapshot.mint_label(2_000_000_000), "Free Mint");
    }

    #[test]
    fn balance_label_hides_while_loading() {
        let mut snapshot = DashboardSnapshot {
            balance: Balance(3_000_000_000),
            ..DashboardSnapshot::default()
        };
        assert_eq!(snapshot.balance_label(), "Balance: 3.000 SUI");
        snapshot.loading = true;
        assert_eq!(snapshot.balance_label(), "Loading...");
    }
}
