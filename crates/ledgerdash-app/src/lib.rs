//! # LedgerDash App - Headless Dashboard Core
//!
//! State synchronization and mutation orchestration for a ledger-backed asset
//! and whitelist dashboard. The crate keeps a client-side view of remote
//! ownership and access-control state consistent with the ledger by
//! re-querying on discrete local events; there is no push channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                   DashboardController                     │
//! │  snapshot (watch) · identity lifecycle · user actions     │
//! ├─────────────────┬───────────────────┬─────────────────────┤
//! │ ChainStateReader│ MutationOrchestr. │ Reconciliation-     │
//! │ (reads)         │ (writes)          │ Scheduler (latches) │
//! ├─────────────────┴───────────────────┴─────────────────────┤
//! │                 LedgerClient (trait)                      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledgerdash_app::{AppConfig, DashboardController};
//!
//! let controller = DashboardController::new(AppConfig::from_env()?, client)?;
//! controller.connect(account).await;
//! controller.grant_access("0xb0b", "Bob").await?;
//! let snapshot = controller.snapshot();
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod errors;
pub mod ids;
pub mod ledger;
pub mod orchestrator;
pub mod reader;
pub mod scheduler;
pub mod views;

pub use config::{AppConfig, ConfigError, Network};
pub use controller::DashboardController;
pub use errors::{ErrorCategory, LedgerError, MutationError, QueryError, QueryKind};
pub use ids::{canonical_type_tag, Address, IdParseError, ObjectId};
pub use ledger::{
    CallArg, DynamicField, ExecutionStatus, InspectResults, LedgerClient, MoveCall, MoveTarget,
    ObjectChange, OwnedObject, Payment, TransactionOutcome, TransactionRequest,
};
pub use orchestrator::{
    MintRequest, MutationId, MutationKind, MutationOrchestrator, MutationReceipt, MutationRequest,
    MutationStatus, MutationTarget, OptimisticEffect, PendingMutation, PreparedMutation,
};
pub use reader::{AccountStanding, ChainStateReader, RefreshPayload};
pub use scheduler::{ChangeSignal, Completion, ReconciliationScheduler, RefreshKind, RefreshTicket};
pub use views::{
    AccessEntry, AccessList, Balance, DashboardSnapshot, OwnedAsset, PriceLabel, StatusTone,
    SyncPhase, ViewMode,
};
