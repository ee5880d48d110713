//! # Chain State Reader
//!
//! Translates ledger read responses into dashboard entities. Every query is
//! independent: a failure is logged and degrades that one entity to its
//! default, leaving the others untouched.

use crate::config::{AppConfig, MODULE_NAME};
use crate::errors::{QueryError, QueryKind};
use crate::ids::{canonical_type_tag, Address};
use crate::ledger::{CallArg, LedgerClient, MoveCall, MoveTarget, OwnedObject};
use crate::scheduler::RefreshKind;
use crate::views::{
    reprice, AccessEntry, AccessList, Balance, DashboardSnapshot, OwnedAsset, PriceLabel,
    STATUS_PLACED,
};
use serde_json::Value;
use std::sync::Arc;

/// Move function evaluated for the membership predicate.
pub const MEMBERSHIP_FUNCTION: &str = "is_whitelisted";

const UNNAMED_ASSET: &str = "Unnamed NFT";
const NO_DESCRIPTION: &str = "No description";

/// Membership and capability, refreshed together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountStanding {
    /// Account passes the membership predicate
    pub is_member: bool,
    /// Account owns an administrative capability
    pub is_admin: bool,
}

/// Result of one scoped refresh, ready to be applied to a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshPayload {
    /// Replacement asset list
    Assets(Vec<OwnedAsset>),
    /// Replacement access list
    AccessList(AccessList),
    /// Fresh membership and capability flags
    Standing(AccountStanding),
    /// Fresh balance
    Balance(Balance),
}

impl RefreshPayload {
    /// Kind this payload answers.
    pub fn kind(&self) -> RefreshKind {
        match self {
            Self::Assets(_) => RefreshKind::Assets,
            Self::AccessList(_) => RefreshKind::AccessList,
            Self::Standing(_) => RefreshKind::Standing,
            Self::Balance(_) => RefreshKind::Balance,
        }
    }

    /// Replace the affected part of `snapshot`, re-deriving price labels.
    ///
    /// Returns whether anything changed.
    pub fn apply(self, snapshot: &mut DashboardSnapshot, mint_price: u64) -> bool {
        let before = snapshot.clone();
        match self {
            Self::Assets(assets) => snapshot.assets = assets,
            Self::AccessList(list) => snapshot.access_list = list,
            Self::Standing(standing) => {
                snapshot.is_member = standing.is_member;
                snapshot.is_admin = standing.is_admin;
            }
            Self::Balance(balance) => snapshot.balance = balance,
        }
        reprice(
            &mut snapshot.assets,
            PriceLabel::for_membership(snapshot.is_member, mint_price),
        );
        *snapshot != before
    }
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Map an owned object to an asset, filling missing fields with fallbacks.
pub fn asset_from_object(object: &OwnedObject, price: PriceLabel) -> OwnedAsset {
    let text = |key: &str| object.fields.get(key).and_then(Value::as_str);

    let traits = object
        .fields
        .get("traits")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    OwnedAsset {
        object_id: object.object_id.clone(),
        name: text("name")
            .filter(|s| !s.is_empty())
            .unwrap_or(UNNAMED_ASSET)
            .to_string(),
        image_url: text("image_url")
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        description: text("description")
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        price,
        status: STATUS_PLACED.to_string(),
        traits,
    }
}

/// Decode the membership predicate result. A missing value is `false`.
pub fn decode_membership(first_byte: Option<u8>) -> bool {
    first_byte == Some(1)
}

// =============================================================================
// ChainStateReader
// =============================================================================

/// Read side of the dashboard.
#[derive(Clone)]
pub struct ChainStateReader {
    client: Arc<dyn LedgerClient>,
    config: Arc<AppConfig>,
}

impl ChainStateReader {
    /// Create a reader over a ledger client.
    pub fn new(client: Arc<dyn LedgerClient>, config: Arc<AppConfig>) -> Self {
        Self { client, config }
    }

    /// Assets of the recognized type owned by `owner`.
    pub async fn owned_assets(
        &self,
        owner: &Address,
        is_member: bool,
    ) -> Result<Vec<OwnedAsset>, QueryError> {
        let asset_type = self.config.asset_type();
        let objects = self
            .client
            .get_owned_objects(owner, Some(&asset_type))
            .await
            .map_err(|e| QueryError::new(QueryKind::OwnedAssets, e))?;

        let price = PriceLabel::for_membership(is_member, self.config.mint_price);
        Ok(objects
            .iter()
            .filter(|o| is_of_type(o, &asset_type))
            .map(|o| asset_from_object(o, price))
            .collect())
    }

    /// Current whitelist, one entry per member address.
    pub async fn access_entries(&self) -> Result<AccessList, QueryError> {
        let fields = self
            .client
            .get_dynamic_fields(&self.config.whitelist_id)
            .await
            .map_err(|e| QueryError::new(QueryKind::AccessList, e))?;

        let mut entries = Vec::with_capacity(fields.len());
        for field in fields {
            match Address::parse(&field.key) {
                Ok(address) => entries.push(AccessEntry::from_address(address)),
                Err(err) => tracing::debug!(key = %field.key, error = %err, "Skipping non-address whitelist key"),
            }
        }
        Ok(AccessList::from_entries(entries))
    }

    /// Whether `owner` holds at least one administrative capability.
    pub async fn has_admin_capability(&self, owner: &Address) -> Result<bool, QueryError> {
        let capability_type = self.config.capability_type();
        let objects = self
            .client
            .get_owned_objects(owner, Some(&capability_type))
            .await
            .map_err(|e| QueryError::new(QueryKind::Capability, e))?;
        Ok(objects.iter().any(|o| is_of_type(o, &capability_type)))
    }

    /// Evaluate the read-only membership predicate for `owner`.
    pub async fn is_member(&self, owner: &Address) -> Result<bool, QueryError> {
        let call = MoveCall {
            target: MoveTarget::new(
                self.config.package_id.clone(),
                MODULE_NAME,
                MEMBERSHIP_FUNCTION,
            ),
            arguments: vec![
                CallArg::Object(self.config.whitelist_id.clone()),
                CallArg::Address(owner.clone()),
            ],
        };
        let results = self
            .client
            .dev_inspect(&call, owner)
            .await
            .map_err(|e| QueryError::new(QueryKind::Membership, e))?;
        Ok(decode_membership(results.first_byte()))
    }

    /// Gas balance of `owner`.
    pub async fn balance(&self, owner: &Address) -> Result<Balance, QueryError> {
        self.client
            .get_balance(owner)
            .await
            .map(Balance)
            .map_err(|e| QueryError::new(QueryKind::Balance, e))
    }

    /// Membership and capability, each degrading independently.
    pub async fn standing(&self, owner: &Address) -> AccountStanding {
        let (member, admin) =
            futures::join!(self.is_member(owner), self.has_admin_capability(owner));
        AccountStanding {
            is_member: or_default(member),
            is_admin: or_default(admin),
        }
    }

    /// Run the query (or queries) behind one refresh kind.
    ///
    /// Never fails: failed queries resolve to their entity's default.
    #[tracing::instrument(level = "debug", skip(self, owner), fields(owner = %owner))]
    pub async fn fetch(&self, kind: RefreshKind, owner: &Address, is_member: bool) -> RefreshPayload {
        match kind {
            RefreshKind::Assets => {
                RefreshPayload::Assets(or_default(self.owned_assets(owner, is_member).await))
            }
            RefreshKind::AccessList => {
                RefreshPayload::AccessList(or_default(self.access_entries().await))
            }
            RefreshKind::Standing => RefreshPayload::Standing(self.standing(owner).await),
            RefreshKind::Balance => RefreshPayload::Balance(or_default(self.balance(owner).await)),
        }
    }
}

/// Untyped objects are trusted to match the filter sent with the query.
fn is_of_type(object: &OwnedObject, expected: &str) -> bool {
    object
        .type_tag
        .as_deref()
        .map_or(true, |tag| canonical_type_tag(tag) == expected)
}

fn or_default<T: Default>(result: Result<T, QueryError>) -> T {
    result.unwrap_or_else(|err| {
        tracing::warn!(query = %err.query, error = %err, "Query failed; using default");
        T::default()
    })
}
