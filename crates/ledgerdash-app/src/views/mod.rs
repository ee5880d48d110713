//! # View State Module
//!
//! This module contains the view state types that represent what the
//! dashboard currently believes about the ledger. These types are plain data
//! and can be:
//!
//! - Serialized for debugging and the demo CLI
//! - Cloned out of the controller as immutable snapshots
//! - Observed through a `tokio::sync::watch` subscription

pub mod access;
pub mod assets;
pub mod snapshot;

pub use access::{fallback_display_name, AccessEntry, AccessList, DEFAULT_AVATAR};
pub use assets::{format_sui, reprice, OwnedAsset, PriceLabel, StatusTone, STATUS_PLACED};
pub use snapshot::{Balance, DashboardSnapshot, SyncPhase, ViewMode};
