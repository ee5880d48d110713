//! LedgerDash Testing Infrastructure
//!
//! An in-memory ledger simulator with fault injection and call gating, plus
//! fixtures for driving a [`ledgerdash_app::DashboardController`] against it.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,ignore
//! use ledgerdash_testkit::*;
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let harness = TestHarness::standard();
//!     harness.controller.connect(alice()).await;
//!     assert!(harness.controller.snapshot().is_admin);
//! }
//! ```

pub mod fixtures;
pub mod gate;
pub mod ledger;

pub use fixtures::*;
pub use gate::Gate;
pub use ledger::{InMemoryLedger, LedgerOp, SIMULATED_GAS_FEE};
