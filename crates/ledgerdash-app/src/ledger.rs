//! # LedgerClient: Remote Ledger Boundary
//!
//! This module defines the `LedgerClient` trait, which abstracts every call the
//! dashboard makes against the remote ledger: owned-object enumeration,
//! dynamic-field enumeration, read-only call inspection, balance lookup, and
//! signed transaction execution. Keeping the node and wallet behind a trait
//! lets `ledgerdash-app` stay a pure state core.
//!
//! ## Design
//!
//! ```text
//! ledgerdash-app (pure)              node / wallet adapter
//! ┌──────────────────────┐          ┌──────────────────────┐
//! │ DashboardController  │          │ RPC client           │
//! │   ┌──────────────┐   │          │   implements         │
//! │   │ LedgerClient │◄──┼──────────│   LedgerClient       │
//! │   └──────────────┘   │          │                      │
//! └──────────────────────┘          └──────────────────────┘
//! ```
//!
//! Every method is a suspension point. Implementations own timeouts; the
//! dashboard never enforces one locally.

use crate::errors::LedgerError;
use crate::ids::{Address, ObjectId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Read Types
// =============================================================================

/// An object owned by an address, with its Move fields as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedObject {
    /// Object identifier
    pub object_id: ObjectId,
    /// Fully qualified Move type, when the node reports it
    pub type_tag: Option<String>,
    /// Struct fields (`content.fields`)
    pub fields: serde_json::Value,
}

/// A dynamic field hanging off a parent collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicField {
    /// Field key (`name.value`)
    pub key: String,
}

/// One value returned from an inspected Move call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValue {
    /// BCS-encoded value
    pub bytes: Vec<u8>,
    /// Move type of the value
    pub type_tag: String,
}

/// Return values of one command in an inspected transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// Values returned by the command
    pub return_values: Vec<ReturnValue>,
}

/// Result envelope of a read-only call inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectResults {
    /// One entry per command
    pub results: Vec<CallResult>,
}

impl InspectResults {
    /// Envelope holding a single returned value.
    pub fn single(bytes: Vec<u8>, type_tag: impl Into<String>) -> Self {
        Self {
            results: vec![CallResult {
                return_values: vec![ReturnValue {
                    bytes,
                    type_tag: type_tag.into(),
                }],
            }],
        }
    }

    /// First byte of the first value returned by the first command.
    pub fn first_byte(&self) -> Option<u8> {
        self.results
            .first()?
            .return_values
            .first()?
            .bytes
            .first()
            .copied()
    }
}

// =============================================================================
// Write Types
// =============================================================================

/// Fully qualified Move function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveTarget {
    /// Package identifier
    pub package: ObjectId,
    /// Module name
    pub module: String,
    /// Function name
    pub function: String,
}

impl MoveTarget {
    /// Create a target.
    pub fn new(package: ObjectId, module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            package,
            module: module.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for MoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.function)
    }
}

/// Argument passed to a Move call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    /// Reference to an on-chain object
    Object(ObjectId),
    /// Pure address value
    Address(Address),
    /// Pure UTF-8 string value
    String(String),
}

/// A Move call with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCall {
    /// Called function
    pub target: MoveTarget,
    /// Call arguments in order
    pub arguments: Vec<CallArg>,
}

/// Payment attached to a call, appended as its last argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payment {
    /// A coin of `amount` MIST split from the gas coin
    SplitFromGas {
        /// Coin value in MIST
        amount: u64,
    },
}

impl Payment {
    /// Value carried by the payment.
    pub fn amount(&self) -> u64 {
        match self {
            Self::SplitFromGas { amount } => *amount,
        }
    }
}

/// A write the wallet signs and the ledger executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Signing account
    pub sender: Address,
    /// The call to execute
    pub call: MoveCall,
    /// Optional payment coin
    pub payment: Option<Payment>,
    /// Gas budget ceiling; `None` lets the wallet estimate
    pub gas_budget: Option<u64>,
}

/// Execution status reported in transaction effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Effects were applied
    Success,
    /// Execution aborted; only gas was charged
    Failure {
        /// Abort or error description
        error: String,
    },
}

/// Object-level change caused by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectChange {
    /// A new object was created
    Created {
        /// New object
        object_id: ObjectId,
        /// Its Move type
        object_type: String,
    },
    /// An existing object was modified
    Mutated {
        /// Modified object
        object_id: ObjectId,
    },
    /// An object was deleted
    Deleted {
        /// Deleted object
        object_id: ObjectId,
    },
}

/// Outcome of an executed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    /// Transaction digest
    pub digest: String,
    /// Execution status
    pub status: ExecutionStatus,
    /// Object changes (empty on failure)
    pub object_changes: Vec<ObjectChange>,
    /// Gas charged in MIST
    pub gas_used: u64,
}

impl TransactionOutcome {
    /// Whether effects were applied.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Success)
    }

    /// Objects created by the transaction.
    pub fn created(&self) -> impl Iterator<Item = &ObjectId> {
        self.object_changes.iter().filter_map(|change| match change {
            ObjectChange::Created { object_id, .. } => Some(object_id),
            _ => None,
        })
    }

    /// Objects deleted by the transaction.
    pub fn deleted(&self) -> impl Iterator<Item = &ObjectId> {
        self.object_changes.iter().filter_map(|change| match change {
            ObjectChange::Deleted { object_id } => Some(object_id),
            _ => None,
        })
    }
}

// =============================================================================
// Client Trait
// =============================================================================

/// Remote ledger operations consumed by the dashboard.
///
/// The primary implementation wraps a full-node RPC client and a wallet
/// signer. Tests use the in-memory simulator from `ledgerdash-testkit`.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Enumerate objects owned by `owner`, optionally restricted to a struct type.
    async fn get_owned_objects(
        &self,
        owner: &Address,
        struct_type: Option<&str>,
    ) -> Result<Vec<OwnedObject>, LedgerError>;

    /// Enumerate dynamic fields of a parent collection.
    async fn get_dynamic_fields(&self, parent: &ObjectId) -> Result<Vec<DynamicField>, LedgerError>;

    /// Evaluate a call without committing any state change.
    async fn dev_inspect(
        &self,
        call: &MoveCall,
        sender: &Address,
    ) -> Result<InspectResults, LedgerError>;

    /// Total gas-coin balance of `owner` in MIST.
    async fn get_balance(&self, owner: &Address) -> Result<u64, LedgerError>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Sign and execute a transaction.
    ///
    /// `Err` means the request never executed (transport failure or
    /// rejection). An executed-but-aborted transaction is `Ok` with a
    /// [`ExecutionStatus::Failure`] status.
    async fn execute(
        &self,
        transaction: &TransactionRequest,
    ) -> Result<TransactionOutcome, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_byte_walks_the_envelope() {
        assert_eq!(InspectResults::default().first_byte(), None);
        assert_eq!(InspectResults::single(vec![1, 0], "bool").first_byte(), Some(1));

        let empty_value = InspectResults::single(Vec::new(), "bool");
        assert_eq!(empty_value.first_byte(), None);

        let no_values = InspectResults {
            results: vec![CallResult::default()],
        };
        assert_eq!(no_values.first_byte(), None);
    }

    #[test]
    fn outcome_exposes_created_and_deleted() {
        let a = ObjectId::parse("0xa").unwrap();
        let b = ObjectId::parse("0xb").unwrap();
        let outcome = TransactionOutcome {
            digest: "D1".into(),
            status: ExecutionStatus::Success,
            object_changes: vec![
                ObjectChange::Created {
                    object_id: a.clone(),
                    object_type: "0x1::test_NFT::NFT".into(),
                },
                ObjectChange::Mutated {
                    object_id: ObjectId::parse("0xc").unwrap(),
                },
                ObjectChange::Deleted { object_id: b.clone() },
            ],
            gas_used: 10,
        };

        assert!(outcome.is_success());
        assert_eq!(outcome.created().collect::<Vec<_>>(), vec![&a]);
        assert_eq!(outcome.deleted().collect::<Vec<_>>(), vec![&b]);
    }

    #[test]
    fn target_displays_fully_qualified() {
        let target = MoveTarget::new(ObjectId::parse("0x2A").unwrap(), "test_NFT", "remove_nft");
        assert_eq!(target.to_string(), "0x2a::test_NFT::remove_nft");
    }
}
