//! # Owned Asset View State

use crate::config::MIST_PER_SUI;
use crate::ids::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status label given to every enumerated asset.
pub const STATUS_PLACED: &str = "Placed";

/// Format a MIST amount as SUI, dropping trailing zero decimals.
pub fn format_sui(mist: u64) -> String {
    let whole = mist / MIST_PER_SUI;
    let frac = mist % MIST_PER_SUI;
    if frac == 0 {
        return format!("{whole} SUI");
    }
    let digits = format!("{frac:09}");
    format!("{whole}.{} SUI", digits.trim_end_matches('0'))
}

// =============================================================================
// Price Label
// =============================================================================

/// Price shown next to an asset. Derived, never fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceLabel {
    /// Account is whitelisted and mints for free
    Free,
    /// Account pays the mint price
    Paid {
        /// Mint price in MIST
        mist: u64,
    },
}

impl PriceLabel {
    /// Derive the label from the membership flag.
    pub fn for_membership(is_member: bool, mint_price: u64) -> Self {
        if is_member {
            Self::Free
        } else {
            Self::Paid { mist: mint_price }
        }
    }
}

impl fmt::Display for PriceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => f.write_str("Free"),
            Self::Paid { mist } => f.write_str(&format_sui(*mist)),
        }
    }
}

/// Badge tone for an asset status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    /// `Active`
    Success,
    /// `Pending`
    Warning,
    /// Anything else
    Error,
}

// =============================================================================
// Owned Asset
// =============================================================================

/// An asset owned by the connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedAsset {
    /// Ledger identifier; the join key between local and remote state
    pub object_id: ObjectId,
    /// Display name
    pub name: String,
    /// Optional image reference
    pub image_url: Option<String>,
    /// Description
    pub description: String,
    /// Derived price label
    pub price: PriceLabel,
    /// Status label
    pub status: String,
    /// Trait strings
    pub traits: Vec<String>,
}

impl OwnedAsset {
    /// Badge tone for this asset's status.
    pub fn status_tone(&self) -> StatusTone {
        match self.status.as_str() {
            "Active" => StatusTone::Success,
            "Pending" => StatusTone::Warning,
            _ => StatusTone::Error,
        }
    }
}

/// Re-derive every asset's price label.
pub fn reprice(assets: &mut [OwnedAsset], price: PriceLabel) {
    for asset in assets {
        asset.price = price;
    }
}
