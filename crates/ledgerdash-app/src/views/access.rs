//! # Access List View State
//!
//! Cached projection of the ledger-side whitelist. The ledger holds a set;
//! the view keeps table order and enforces one entry per address.

use crate::ids::Address;
use serde::{Deserialize, Serialize};

/// Image reference used when an entry carries no richer metadata.
pub const DEFAULT_AVATAR: &str = "/path/to/default-image.jpg";

/// Deterministic display name for an address without metadata.
pub fn fallback_display_name(address: &Address) -> String {
    format!("User {}", address.prefix(6))
}

/// A whitelisted address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    /// Whitelisted address (unique within the list)
    pub address: Address,
    /// Display name
    pub name: String,
    /// Optional image reference
    pub image: Option<String>,
    /// Optional role label
    pub role: Option<String>,
}

impl AccessEntry {
    /// Entry as enumerated from the ledger, with derived name and default avatar.
    pub fn from_address(address: Address) -> Self {
        Self {
            name: fallback_display_name(&address),
            address,
            image: Some(DEFAULT_AVATAR.to_string()),
            role: None,
        }
    }

    /// Entry carrying an operator-supplied name.
    pub fn named(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            image: None,
            role: None,
        }
    }
}

// =============================================================================
// AccessList
// =============================================================================

/// Ordered access list with one entry per address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessList {
    entries: Vec<AccessEntry>,
}

impl AccessList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries; later duplicates of an address are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = AccessEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            if !list.contains(&entry.address) {
                list.entries.push(entry);
            }
        }
        list
    }

    /// Insert or replace the entry for its address. Returns `true` if new.
    pub fn upsert(&mut self, entry: AccessEntry) -> bool {
        match self.entries.iter_mut().find(|e| e.address == entry.address) {
            Some(existing) => {
                *existing = entry;
                false
            }
            None => {
                self.entries.push(entry);
                true
            }
        }
    }

    /// Remove the entry for `address`.
    pub fn remove(&mut self, address: &Address) -> Option<AccessEntry> {
        let index = self.entries.iter().position(|e| &e.address == address)?;
        Some(self.entries.remove(index))
    }

    /// Entry for `address`.
    pub fn get(&self, address: &Address) -> Option<&AccessEntry> {
        self.entries.iter().find(|e| &e.address == address)
    }

    /// Whether `address` is listed.
    pub fn contains(&self, address: &Address) -> bool {
        self.get(address).is_some()
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &AccessEntry> {
        self.entries.iter()
    }

    /// Listed addresses in table order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.entries.iter().map(|e| &e.address)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
