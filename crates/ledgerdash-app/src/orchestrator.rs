//! # Mutation Orchestrator
//!
//! Validates user input, builds the ledger write for each mutation kind,
//! submits it, and tracks the request until its outcome is known.
//!
//! The orchestrator never holds dashboard state. It describes the optimistic
//! effect of a mutation ([`OptimisticEffect`]) and leaves applying it to the
//! controller that owns the snapshot.
//!
//! ## Optimistic policy
//!
//! | Mutation      | Local effect before the write resolves |
//! |---------------|-----------------------------------------|
//! | grant access  | entry inserted                          |
//! | revoke access | entry removed                           |
//! | remove asset  | none, asset stays until confirmed       |
//! | mint          | none, new identifier unknown until then |
//!
//! Failed writes are never rolled back by hand. The controller re-queries the
//! affected kind, which restores the ledger's view.

use crate::config::{AppConfig, MODULE_NAME};
use crate::errors::{LedgerError, MutationError};
use crate::ids::{Address, ObjectId};
use crate::ledger::{
    CallArg, ExecutionStatus, LedgerClient, MoveCall, MoveTarget, Payment, TransactionRequest,
};
use crate::scheduler::ChangeSignal;
use crate::views::{AccessEntry, AccessList};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

const MISSING_ACCOUNT: &str = "Please connect your wallet first.";
const INCOMPLETE_GRANT: &str = "Please fill in all the whitelist details before adding.";
const INCOMPLETE_REVOKE: &str = "Please provide the address to remove from the whitelist.";
const INCOMPLETE_REMOVAL: &str = "Please select the NFT to remove.";
const INCOMPLETE_MINT: &str = "Please fill in all the NFT details before minting.";

// =============================================================================
// Mutation Kinds
// =============================================================================

/// The writes the dashboard can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// Add an address to the whitelist
    GrantAccess,
    /// Remove an address from the whitelist
    RevokeAccess,
    /// Destroy an owned asset
    RemoveAsset,
    /// Mint against a payment coin
    MintPaid,
    /// Mint through the whitelist allowance
    MintFree,
}

impl MutationKind {
    /// Move function called by this mutation.
    pub fn function_name(self) -> &'static str {
        match self {
            Self::GrantAccess => "add_to_whitelist",
            Self::RevokeAccess => "remove_from_whitelist",
            Self::RemoveAsset => "remove_nft",
            Self::MintPaid => "paid_mint",
            Self::MintFree => "mint_for_whitelisted",
        }
    }

    /// Change signal emitted once the outcome is known.
    pub fn signal(self) -> ChangeSignal {
        match self {
            Self::GrantAccess | Self::RevokeAccess => ChangeSignal::AccessChanged,
            Self::RemoveAsset | Self::MintPaid | Self::MintFree => ChangeSignal::AssetsChanged,
        }
    }

    /// Whether the fixed gas budget ceiling applies.
    pub fn is_budgeted(self) -> bool {
        matches!(self, Self::RevokeAccess | Self::RemoveAsset | Self::MintPaid)
    }

    /// Message reported on success.
    pub fn success_message(self) -> &'static str {
        match self {
            Self::GrantAccess => "Address added to whitelist successfully!",
            Self::RevokeAccess => "Address removed from whitelist successfully!",
            Self::RemoveAsset => "NFT removed successfully!",
            Self::MintPaid => "Paid mint successful!",
            Self::MintFree => "NFT minted successfully!",
        }
    }

    /// Message reported on a remote failure.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::GrantAccess => "Failed to add to whitelist",
            Self::RevokeAccess => "Failed to remove from whitelist",
            Self::RemoveAsset => "Failed to remove NFT",
            Self::MintPaid => "Failed to mint NFT",
            Self::MintFree => "Failed to mint NFT. You may not be whitelisted",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GrantAccess => "grant access",
            Self::RevokeAccess => "revoke access",
            Self::RemoveAsset => "remove asset",
            Self::MintPaid => "paid mint",
            Self::MintFree => "free mint",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Metadata for a new asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    /// Display name
    pub name: String,
    /// Image reference
    pub image_url: String,
    /// Description
    pub description: String,
}

impl MintRequest {
    /// Create a mint request.
    pub fn new(
        name: impl Into<String>,
        image_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            description: description.into(),
        }
    }

    fn is_complete(&self) -> bool {
        [&self.name, &self.image_url, &self.description]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Raw user input for one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationRequest {
    /// Grant whitelist access
    GrantAccess {
        /// Address to add
        address: String,
        /// Display name for the new entry
        name: String,
    },
    /// Revoke whitelist access
    RevokeAccess {
        /// Address to remove
        address: String,
    },
    /// Remove an owned asset
    RemoveAsset {
        /// Asset identifier
        object_id: String,
    },
    /// Paid mint
    MintPaid(MintRequest),
    /// Free mint
    MintFree(MintRequest),
}

impl MutationRequest {
    /// Mutation kind of this request.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::GrantAccess { .. } => MutationKind::GrantAccess,
            Self::RevokeAccess { .. } => MutationKind::RevokeAccess,
            Self::RemoveAsset { .. } => MutationKind::RemoveAsset,
            Self::MintPaid(_) => MutationKind::MintPaid,
            Self::MintFree(_) => MutationKind::MintFree,
        }
    }
}

/// Entity a mutation acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationTarget {
    /// A whitelist member
    Member(Address),
    /// An existing asset
    Asset(ObjectId),
    /// An asset that does not exist yet
    NewAsset,
}

impl fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(address) => write!(f, "{address}"),
            Self::Asset(id) => write!(f, "{id}"),
            Self::NewAsset => f.write_str("new asset"),
        }
    }
}

/// Local change applied before a write resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptimisticEffect {
    /// Show the entry right away
    InsertAccessEntry(AccessEntry),
    /// Hide the entry right away
    RemoveAccessEntry(Address),
}

impl OptimisticEffect {
    /// Apply to an access list. Returns whether the list changed.
    pub fn apply(&self, list: &mut AccessList) -> bool {
        match self {
            Self::InsertAccessEntry(entry) => {
                if list.get(&entry.address) == Some(entry) {
                    return false;
                }
                list.upsert(entry.clone());
                true
            }
            Self::RemoveAccessEntry(address) => list.remove(address).is_some(),
        }
    }
}

// =============================================================================
// Lifecycle Records
// =============================================================================

/// Identifier of one submitted mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationId(Uuid);

impl MutationId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated mutation, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedMutation {
    /// Lifecycle identifier
    pub id: MutationId,
    /// Mutation kind
    pub kind: MutationKind,
    /// Entity acted on
    pub target: MutationTarget,
    /// The write to execute
    pub transaction: TransactionRequest,
    /// Local effect to apply before submission
    pub optimistic: Option<OptimisticEffect>,
}

/// Where a tracked mutation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    /// Submitted, outcome unknown
    Pending,
    /// Effects applied on the ledger
    Succeeded,
    /// Rejected, aborted, or unreachable
    Failed,
}

/// In-flight write record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    /// Lifecycle identifier
    pub id: MutationId,
    /// Mutation kind
    pub kind: MutationKind,
    /// Entity acted on
    pub target: MutationTarget,
    /// Account that submitted the write
    pub sender: Address,
    /// Local effect held on top of refreshed state until the write settles
    pub optimistic: Option<OptimisticEffect>,
    /// Current status
    pub status: MutationStatus,
}

/// Confirmation of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationReceipt {
    /// Lifecycle identifier
    pub id: MutationId,
    /// Mutation kind
    pub kind: MutationKind,
    /// Transaction digest
    pub digest: String,
    /// Objects created by the write
    pub created: Vec<ObjectId>,
    /// Objects deleted by the write
    pub deleted: Vec<ObjectId>,
    /// Message for the user
    pub message: String,
}

// =============================================================================
// MutationOrchestrator
// =============================================================================

/// Write side of the dashboard.
pub struct MutationOrchestrator {
    client: Arc<dyn LedgerClient>,
    config: Arc<AppConfig>,
    pending: Mutex<HashMap<MutationId, PendingMutation>>,
}

impl MutationOrchestrator {
    /// Create an orchestrator over a ledger client.
    pub fn new(client: Arc<dyn LedgerClient>, config: Arc<AppConfig>) -> Self {
        Self {
            client,
            config,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Validate `request` and build its write. Performs no I/O.
    pub fn prepare(
        &self,
        sender: Option<&Address>,
        request: MutationRequest,
    ) -> Result<PreparedMutation, MutationError> {
        let kind = request.kind();
        let sender = sender.ok_or_else(|| MutationError::validation(kind, MISSING_ACCOUNT))?;
        let whitelist = CallArg::Object(self.config.whitelist_id.clone());

        let (target, arguments, optimistic) = match request {
            MutationRequest::GrantAccess { address, name } => {
                if address.trim().is_empty() || name.trim().is_empty() {
                    return Err(MutationError::validation(kind, INCOMPLETE_GRANT));
                }
                let member = parse_address(kind, &address)?;
                let entry = AccessEntry::named(member.clone(), name.trim());
                (
                    MutationTarget::Member(member.clone()),
                    vec![whitelist, CallArg::Address(member)],
                    Some(OptimisticEffect::InsertAccessEntry(entry)),
                )
            }
            MutationRequest::RevokeAccess { address } => {
                if address.trim().is_empty() {
                    return Err(MutationError::validation(kind, INCOMPLETE_REVOKE));
                }
                let member = parse_address(kind, &address)?;
                (
                    MutationTarget::Member(member.clone()),
                    vec![whitelist, CallArg::Address(member.clone())],
                    Some(OptimisticEffect::RemoveAccessEntry(member)),
                )
            }
            MutationRequest::RemoveAsset { object_id } => {
                if object_id.trim().is_empty() {
                    return Err(MutationError::validation(kind, INCOMPLETE_REMOVAL));
                }
                let asset = ObjectId::parse(&object_id).map_err(|e| {
                    MutationError::validation(kind, format!("Invalid NFT identifier: {e}"))
                })?;
                (
                    MutationTarget::Asset(asset.clone()),
                    vec![CallArg::Object(asset)],
                    None,
                )
            }
            MutationRequest::MintPaid(mint) => {
                if !mint.is_complete() {
                    return Err(MutationError::validation(kind, INCOMPLETE_MINT));
                }
                (MutationTarget::NewAsset, metadata_args(mint), None)
            }
            MutationRequest::MintFree(mint) => {
                if !mint.is_complete() {
                    return Err(MutationError::validation(kind, INCOMPLETE_MINT));
                }
                let mut arguments = vec![whitelist];
                arguments.extend(metadata_args(mint));
                (MutationTarget::NewAsset, arguments, None)
            }
        };

        let payment = (kind == MutationKind::MintPaid).then_some(Payment::SplitFromGas {
            amount: self.config.mint_price,
        });
        let gas_budget = kind.is_budgeted().then_some(self.config.gas_budget);

        Ok(PreparedMutation {
            id: MutationId::new(),
            kind,
            target,
            transaction: TransactionRequest {
                sender: sender.clone(),
                call: MoveCall {
                    target: MoveTarget::new(
                        self.config.package_id.clone(),
                        MODULE_NAME,
                        kind.function_name(),
                    ),
                    arguments,
                },
                payment,
                gas_budget,
            },
            optimistic,
        })
    }

    /// Record a prepared mutation as pending.
    pub fn track(&self, prepared: &PreparedMutation) {
        self.pending.lock().insert(
            prepared.id,
            PendingMutation {
                id: prepared.id,
                kind: prepared.kind,
                target: prepared.target.clone(),
                sender: prepared.transaction.sender.clone(),
                optimistic: prepared.optimistic.clone(),
                status: MutationStatus::Pending,
            },
        );
    }

    /// Execute a prepared mutation and classify its outcome.
    #[tracing::instrument(skip(self, prepared), fields(id = %prepared.id, kind = %prepared.kind, target = %prepared.target))]
    pub async fn submit(&self, prepared: &PreparedMutation) -> Result<MutationReceipt, MutationError> {
        let kind = prepared.kind;
        let outcome = self
            .client
            .execute(&prepared.transaction)
            .await
            .map_err(|e: LedgerError| {
                tracing::warn!(error = %e, "Mutation did not reach execution");
                MutationError::from_ledger(kind, e)
            })?;

        if let ExecutionStatus::Failure { error } = &outcome.status {
            tracing::warn!(digest = %outcome.digest, error = %error, "Mutation aborted on ledger");
            return Err(MutationError::submission(kind, error.clone()));
        }

        tracing::info!(digest = %outcome.digest, gas_used = outcome.gas_used, "Mutation succeeded");
        Ok(MutationReceipt {
            id: prepared.id,
            kind,
            digest: outcome.digest.clone(),
            created: outcome.created().cloned().collect(),
            deleted: outcome.deleted().cloned().collect(),
            message: kind.success_message().to_string(),
        })
    }

    /// Resolve a tracked mutation, dropping its record.
    pub fn settle(
        &self,
        id: MutationId,
        result: &Result<MutationReceipt, MutationError>,
    ) -> Option<PendingMutation> {
        let mut record = self.pending.lock().remove(&id)?;
        record.status = if result.is_ok() {
            MutationStatus::Succeeded
        } else {
            MutationStatus::Failed
        };
        Some(record)
    }

    /// Number of writes awaiting an outcome.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Forget a mutation whose outcome will never be observed.
    pub fn abandon(&self, id: MutationId) -> Option<PendingMutation> {
        let record = self.pending.lock().remove(&id)?;
        tracing::warn!(%id, kind = %record.kind, "Mutation dropped before its outcome was known");
        Some(record)
    }

    /// Optimistic effects of `sender`'s unsettled writes, in no particular order.
    pub fn pending_effects(&self, sender: &Address) -> Vec<OptimisticEffect> {
        self.pending
            .lock()
            .values()
            .filter(|record| &record.sender == sender)
            .filter_map(|record| record.optimistic.clone())
            .collect()
    }
}

fn parse_address(kind: MutationKind, raw: &str) -> Result<Address, MutationError> {
    Address::parse(raw).map_err(|e| MutationError::validation(kind, format!("Invalid address: {e}")))
}

fn metadata_args(mint: MintRequest) -> Vec<CallArg> {
    vec![
        CallArg::String(mint.name),
        CallArg::String(mint.description),
        CallArg::String(mint.image_url),
    ]
}
