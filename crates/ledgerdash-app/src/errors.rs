//! Categorized dashboard errors
//!
//! Provides structured error types that enable:
//! - Per-query failure isolation (a failed read degrades one entity only)
//! - Mutation failures classified as input, network, or operation problems
//! - A user-facing message for every action outcome

use crate::orchestrator::MutationKind;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Ledger Collaborator Faults
// ============================================================================

/// Faults reported by a [`LedgerClient`](crate::ledger::LedgerClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The node could not be reached or the connection dropped
    #[error("transport failure: {0}")]
    Transport(String),
    /// The node or wallet refused the request
    #[error("request rejected: {0}")]
    Rejected(String),
    /// The node answered with something we cannot interpret
    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Query Errors
// ============================================================================

/// Read queries issued by the chain state reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Owned asset enumeration
    OwnedAssets,
    /// Whitelist dynamic-field enumeration
    AccessList,
    /// Administrative capability lookup
    Capability,
    /// Read-only membership predicate
    Membership,
    /// Gas balance lookup
    Balance,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OwnedAssets => "owned assets",
            Self::AccessList => "access list",
            Self::Capability => "capability",
            Self::Membership => "membership",
            Self::Balance => "balance",
        };
        f.write_str(label)
    }
}

/// A single read query failed. Isolated: callers degrade that entity only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{query} query failed: {source}")]
pub struct QueryError {
    /// Which query failed
    pub query: QueryKind,
    /// Underlying collaborator fault
    #[source]
    pub source: LedgerError,
}

impl QueryError {
    /// Wrap a ledger fault for a given query.
    pub fn new(query: QueryKind, source: LedgerError) -> Self {
        Self { query, source }
    }
}

// ============================================================================
// Error Categories
// ============================================================================

/// High-level categories for presenting mutation failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input validation errors (correctable by user)
    Input,
    /// Network connectivity errors (often transient)
    Network,
    /// The ledger refused or aborted the write
    Operation,
}

impl ErrorCategory {
    /// Check if this error category is user-correctable.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::Input)
    }

    /// Check if this error category is likely transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network)
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Network => "Network",
            Self::Operation => "Operation",
        }
    }

    /// Get a hint for the user on how to resolve this category of error.
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Input => "Check your input and try again",
            Self::Network => "Check your network connection and retry",
            Self::Operation => "The transaction was not applied",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// Mutation Errors
// ============================================================================

/// Why a mutation did not succeed. Never fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// Input refused locally; no remote call was made
    #[error("{kind}: {reason}")]
    Validation {
        /// Attempted mutation
        kind: MutationKind,
        /// What is missing or malformed
        reason: String,
    },
    /// Rejected by the ledger or aborted during execution
    #[error("{kind} was rejected: {reason}")]
    Submission {
        /// Attempted mutation
        kind: MutationKind,
        /// Ledger-provided reason
        reason: String,
    },
    /// The ledger could not be reached
    #[error("{kind} could not reach the ledger: {reason}")]
    Network {
        /// Attempted mutation
        kind: MutationKind,
        /// Transport-level detail
        reason: String,
    },
}

impl MutationError {
    /// Create a validation error.
    pub fn validation(kind: MutationKind, reason: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a submission error.
    pub fn submission(kind: MutationKind, reason: impl Into<String>) -> Self {
        Self::Submission {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a network error.
    pub fn network(kind: MutationKind, reason: impl Into<String>) -> Self {
        Self::Network {
            kind,
            reason: reason.into(),
        }
    }

    /// Classify a collaborator fault raised while submitting `kind`.
    pub fn from_ledger(kind: MutationKind, error: LedgerError) -> Self {
        match error {
            LedgerError::Transport(reason) => Self::network(kind, reason),
            LedgerError::Rejected(reason) | LedgerError::InvalidResponse(reason) => {
                Self::submission(kind, reason)
            }
        }
    }

    /// The mutation that failed.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Validation { kind, .. } | Self::Submission { kind, .. } | Self::Network { kind, .. } => {
                *kind
            }
        }
    }

    /// Presentation category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Input,
            Self::Submission { .. } => ErrorCategory::Operation,
            Self::Network { .. } => ErrorCategory::Network,
        }
    }

    /// Whether a remote write was attempted.
    pub fn reached_ledger(&self) -> bool {
        !matches!(self, Self::Validation { .. })
    }

    /// Actionable message for the user.
    ///
    /// Submission and network failures read the same way; only the hint
    /// differs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { reason, .. } => reason.clone(),
            Self::Submission { kind, .. } | Self::Network { kind, .. } => {
                format!("{}. {}", kind.failure_message(), self.category().resolution_hint())
            }
        }
    }
}
