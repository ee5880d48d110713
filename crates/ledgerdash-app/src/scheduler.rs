//! # Reconciliation Scheduler
//!
//! Edge-triggered refresh bookkeeping. The scheduler never performs I/O; it
//! decides which re-queries to dispatch and whether a returning response may
//! still be applied.
//!
//! ## Latches
//!
//! Each [`RefreshKind`] has an independent latch:
//!
//! ```text
//!   idle ──request──► in flight ──complete──► idle
//!                        │  ▲
//!               request  │  │ complete (follow-up ticket)
//!                        ▼  │
//!                   in flight + pending
//! ```
//!
//! A request while the kind is in flight only marks it pending, so any number
//! of signals during one refresh yields exactly one extra dispatch.
//!
//! ## Staleness
//!
//! Tickets carry the identity epoch and a per-kind sequence number. A
//! completion from an older epoch is discarded, as is any completion whose
//! sequence is not newer than the last one applied for that kind.

use crate::ids::Address;
use std::fmt;

// =============================================================================
// Refresh Kinds and Signals
// =============================================================================

/// Entity groups that are re-queried together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefreshKind {
    /// Owned assets
    Assets,
    /// Whitelist entries
    AccessList,
    /// Membership predicate and capability flag
    Standing,
    /// Gas balance
    Balance,
}

impl RefreshKind {
    /// Every kind, in dispatch order.
    pub const ALL: [RefreshKind; 4] = [
        RefreshKind::Assets,
        RefreshKind::AccessList,
        RefreshKind::Standing,
        RefreshKind::Balance,
    ];

    fn index(self) -> usize {
        match self {
            Self::Assets => 0,
            Self::AccessList => 1,
            Self::Standing => 2,
            Self::Balance => 3,
        }
    }
}

impl fmt::Display for RefreshKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Assets => "assets",
            Self::AccessList => "access-list",
            Self::Standing => "standing",
            Self::Balance => "balance",
        };
        f.write_str(label)
    }
}

/// Discrete local events that invalidate cached state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeSignal {
    /// The active account was attached or replaced
    IdentityChanged,
    /// An asset write resolved (mint or removal)
    AssetsChanged,
    /// A whitelist write resolved (grant or revoke)
    AccessChanged,
    /// The presentation switched tables
    ViewToggled,
}

impl ChangeSignal {
    /// Kinds re-queried in response to this signal.
    ///
    /// Balance is part of every signal: every write spends gas.
    pub fn kinds(self) -> &'static [RefreshKind] {
        match self {
            Self::IdentityChanged => &RefreshKind::ALL,
            Self::AssetsChanged => &[RefreshKind::Assets, RefreshKind::Balance],
            Self::AccessChanged => &[
                RefreshKind::AccessList,
                RefreshKind::Standing,
                RefreshKind::Balance,
            ],
            Self::ViewToggled => &[RefreshKind::Balance],
        }
    }
}

// =============================================================================
// Tickets
// =============================================================================

/// Permission to run one re-query and later offer its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    /// Kind being refreshed
    pub kind: RefreshKind,
    /// Per-kind dispatch sequence
    pub seq: u64,
    /// Identity epoch at dispatch
    pub epoch: u64,
    /// Account the query runs for
    pub owner: Address,
}

/// What to do with a finished re-query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Whether the response may replace cached state
    pub apply: bool,
    /// Coalesced follow-up refresh to run next
    pub follow_up: Option<RefreshTicket>,
}

impl Completion {
    fn discard() -> Self {
        Self {
            apply: false,
            follow_up: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Latch {
    in_flight: Option<u64>,
    pending: bool,
    last_seq: u64,
    applied_seq: u64,
    dispatched: u64,
    synced: bool,
}

// =============================================================================
// ReconciliationScheduler
// =============================================================================

/// Single-writer refresh scheduler.
#[derive(Debug, Default)]
pub struct ReconciliationScheduler {
    owner: Option<Address>,
    epoch: u64,
    latches: [Latch; 4],
}

impl ReconciliationScheduler {
    /// Create a scheduler with no identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a new identity (or none), invalidating every outstanding ticket.
    ///
    /// Returns the new epoch.
    pub fn reset_identity(&mut self, owner: Option<Address>) -> u64 {
        self.epoch += 1;
        self.owner = owner;
        self.latches = [Latch::default(); 4];
        tracing::debug!(epoch = self.epoch, "Scheduler identity reset");
        self.epoch
    }

    /// Current identity epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current identity.
    pub fn owner(&self) -> Option<&Address> {
        self.owner.as_ref()
    }

    /// Latch `kind`. Returns a ticket when a re-query should start now.
    ///
    /// While the kind is in flight the request is coalesced into a single
    /// pending follow-up and `None` is returned.
    pub fn request(&mut self, kind: RefreshKind) -> Option<RefreshTicket> {
        let owner = self.owner.clone()?;
        let latch = &mut self.latches[kind.index()];
        if latch.in_flight.is_some() {
            if !latch.pending {
                tracing::debug!(%kind, "Refresh coalesced behind in-flight query");
            }
            latch.pending = true;
            return None;
        }
        Some(self.dispatch(kind, owner))
    }

    fn dispatch(&mut self, kind: RefreshKind, owner: Address) -> RefreshTicket {
        let epoch = self.epoch;
        let latch = &mut self.latches[kind.index()];
        latch.last_seq += 1;
        latch.in_flight = Some(latch.last_seq);
        latch.pending = false;
        latch.dispatched += 1;
        tracing::debug!(%kind, seq = latch.last_seq, epoch, "Refresh dispatched");
        RefreshTicket {
            kind,
            seq: latch.last_seq,
            epoch,
            owner,
        }
    }

    /// Offer a finished re-query.
    pub fn complete(&mut self, ticket: &RefreshTicket) -> Completion {
        if ticket.epoch != self.epoch {
            tracing::debug!(kind = %ticket.kind, epoch = ticket.epoch, "Discarding response for superseded identity");
            return Completion::discard();
        }
        let Some(owner) = self.owner.clone() else {
            return Completion::discard();
        };

        let latch = &mut self.latches[ticket.kind.index()];
        let apply = ticket.seq > latch.applied_seq;
        if apply {
            latch.applied_seq = ticket.seq;
            latch.synced = true;
        } else {
            tracing::debug!(kind = %ticket.kind, seq = ticket.seq, "Discarding out-of-order response");
        }
        if latch.in_flight == Some(ticket.seq) {
            latch.in_flight = None;
        }

        let follow_up = if latch.pending && latch.in_flight.is_none() {
            Some(self.dispatch(ticket.kind, owner))
        } else {
            None
        };
        Completion { apply, follow_up }
    }

    /// Release a ticket whose re-query never finished.
    pub fn abandon(&mut self, ticket: &RefreshTicket) {
        if ticket.epoch != self.epoch {
            return;
        }
        let latch = &mut self.latches[ticket.kind.index()];
        if latch.in_flight == Some(ticket.seq) {
            latch.in_flight = None;
            tracing::debug!(kind = %ticket.kind, seq = ticket.seq, "Refresh abandoned");
        }
    }

    /// Whether `kind` has a re-query outstanding.
    pub fn is_in_flight(&self, kind: RefreshKind) -> bool {
        self.latches[kind.index()].in_flight.is_some()
    }

    /// Whether any re-query is outstanding.
    pub fn any_in_flight(&self) -> bool {
        self.latches.iter().any(|l| l.in_flight.is_some())
    }

    /// Whether some kind has not landed a response since the identity changed.
    pub fn initial_sync_pending(&self) -> bool {
        self.owner.is_some() && self.latches.iter().any(|l| !l.synced)
    }

    /// Re-queries dispatched for `kind` under the current identity.
    pub fn dispatch_count(&self, kind: RefreshKind) -> u64 {
        self.latches[kind.index()].dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn owner() -> Address {
        Address::parse("0xA11CE").unwrap()
    }

    fn attached() -> ReconciliationScheduler {
        let mut scheduler = ReconciliationScheduler::new();
        scheduler.reset_identity(Some(owner()));
        scheduler
    }

    #[test]
    fn no_identity_dispatches_nothing() {
        let mut scheduler = ReconciliationScheduler::new();
        assert!(scheduler.request(RefreshKind::Balance).is_none());
        assert!(!scheduler.initial_sync_pending());
    }

    #[test]
    fn signals_map_to_kinds() {
        assert_eq!(ChangeSignal::IdentityChanged.kinds().len(), 4);
        assert_eq!(ChangeSignal::ViewToggled.kinds(), &[RefreshKind::Balance]);
        assert!(ChangeSignal::AssetsChanged.kinds().contains(&RefreshKind::Balance));
        assert!(ChangeSignal::AccessChanged.kinds().contains(&RefreshKind::Standing));
    }

    #[test]
    fn rapid_signals_coalesce_into_one_follow_up() {
        let mut scheduler = attached();
        let first = scheduler.request(RefreshKind::Assets).unwrap();

        assert!(scheduler.request(RefreshKind::Assets).is_none());
        assert!(scheduler.request(RefreshKind::Assets).is_none());

        let done = scheduler.complete(&first);
        assert!(done.apply);
        let second = done.follow_up.unwrap();
        assert_eq!(second.seq, first.seq + 1);

        let done = scheduler.complete(&second);
        assert!(done.apply);
        assert!(done.follow_up.is_none());
        assert_eq!(scheduler.dispatch_count(RefreshKind::Assets), 2);
        assert!(!scheduler.any_in_flight());
    }

    #[test]
    fn kinds_latch_independently() {
        let mut scheduler = attached();
        let assets = scheduler.request(RefreshKind::Assets).unwrap();
        let balance = scheduler.request(RefreshKind::Balance).unwrap();
        assert!(scheduler.is_in_flight(RefreshKind::Assets));
        assert!(scheduler.is_in_flight(RefreshKind::Balance));
        assert!(!scheduler.is_in_flight(RefreshKind::AccessList));

        assert!(scheduler.complete(&balance).follow_up.is_none());
        assert!(scheduler.is_in_flight(RefreshKind::Assets));
        assert!(scheduler.complete(&assets).apply);
    }

    #[test]
    fn identity_change_discards_outstanding_responses() {
        let mut scheduler = attached();
        let stale = scheduler.request(RefreshKind::AccessList).unwrap();
        scheduler.request(RefreshKind::AccessList);

        scheduler.reset_identity(Some(Address::parse("0xB0B").unwrap()));

        let done = scheduler.complete(&stale);
        assert!(!done.apply);
        assert!(done.follow_up.is_none());

        let fresh = scheduler.request(RefreshKind::AccessList).unwrap();
        assert_eq!(fresh.owner.as_str(), "0xb0b");
        assert!(fresh.epoch > stale.epoch);
    }

    #[test]
    fn replayed_ticket_is_not_applied_twice() {
        let mut scheduler = attached();
        let ticket = scheduler.request(RefreshKind::Standing).unwrap();
        assert!(scheduler.complete(&ticket).apply);
        assert!(!scheduler.complete(&ticket).apply);
    }

    #[test]
    fn abandoned_ticket_frees_the_latch() {
        let mut scheduler = attached();
        let ticket = scheduler.request(RefreshKind::Balance).unwrap();
        scheduler.request(RefreshKind::Balance);
        scheduler.abandon(&ticket);

        assert!(!scheduler.is_in_flight(RefreshKind::Balance));
        let retry = scheduler.request(RefreshKind::Balance).unwrap();
        assert_eq!(retry.seq, ticket.seq + 1);
    }

    #[test]
    fn initial_sync_tracks_every_kind() {
        let mut scheduler = attached();
        let tickets: Vec<_> = RefreshKind::ALL
            .iter()
            .filter_map(|k| scheduler.request(*k))
            .collect();
        assert_eq!(tickets.len(), 4);

        for ticket in &tickets[..3] {
            scheduler.complete(ticket);
        }
        assert!(scheduler.initial_sync_pending());
        scheduler.complete(&tickets[3]);
        assert!(!scheduler.initial_sync_pending());
    }

    proptest! {
        #[test]
        fn at_most_one_follow_up_per_completion(requests in proptest::collection::vec(0usize..6, 1..40)) {
            let mut scheduler = attached();
            let mut outstanding = scheduler.request(RefreshKind::Assets);
            let mut total_dispatched = 1u64;

            for burst in requests {
                for _ in 0..burst {
                    prop_assert!(scheduler.request(RefreshKind::Assets).is_none());
                }
                let ticket = outstanding.take().unwrap();
                let done = scheduler.complete(&ticket);
                prop_assert!(done.apply);
                match done.follow_up {
                    Some(next) => {
                        prop_assert!(burst > 0);
                        total_dispatched += 1;
                        outstanding = Some(next);
                    }
                    None => {
                        prop_assert_eq!(burst, 0);
                        outstanding = scheduler.request(RefreshKind::Assets);
                        total_dispatched += 1;
                    }
                }
            }
            prop_assert_eq!(scheduler.dispatch_count(RefreshKind::Assets), total_dispatched);
        }
    }
}
