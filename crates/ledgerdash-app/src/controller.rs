//! # Dashboard Controller
//!
//! Owns the unified [`DashboardSnapshot`] and is the only caller of the chain
//! state reader and the mutation orchestrator.
//!
//! ## State machine
//!
//! ```text
//!                 connect
//!  Disconnected ───────────► Synchronizing (initial)
//!       ▲                          │ every kind landed
//!       │ disconnect               ▼
//!       └──────────────────── Synchronized ◄──┐
//!                                  │          │ scoped refresh landed
//!                                  ▼          │
//!                         Synchronizing (partial)
//! ```
//!
//! The snapshot lives in a `tokio::sync::watch` channel. Presentation either
//! clones it through [`DashboardController::snapshot`] or follows every
//! published value through [`DashboardController::subscribe`].
//!
//! Scheduler bookkeeping sits behind a synchronous lock that is never held
//! across a suspension point.

use crate::config::{AppConfig, ConfigError};
use crate::errors::MutationError;
use crate::ids::Address;
use crate::ledger::LedgerClient;
use crate::orchestrator::{
    MintRequest, MutationId, MutationOrchestrator, MutationReceipt, MutationRequest,
};
use crate::reader::{ChainStateReader, RefreshPayload};
use crate::scheduler::{ChangeSignal, ReconciliationScheduler, RefreshKind, RefreshTicket};
use crate::views::{DashboardSnapshot, SyncPhase};
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

/// Releases a refresh ticket if its query future is dropped before completing.
struct DispatchGuard<'a> {
    scheduler: &'a Mutex<ReconciliationScheduler>,
    ticket: Option<RefreshTicket>,
}

impl<'a> DispatchGuard<'a> {
    fn new(scheduler: &'a Mutex<ReconciliationScheduler>, ticket: &RefreshTicket) -> Self {
        Self {
            scheduler,
            ticket: Some(ticket.clone()),
        }
    }

    fn disarm(mut self) {
        self.ticket = None;
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.scheduler.lock().abandon(&ticket);
        }
    }
}

/// Forgets a tracked mutation if its future is dropped before the outcome arrives.
struct PendingGuard<'a> {
    controller: &'a DashboardController,
    id: Option<MutationId>,
}

impl<'a> PendingGuard<'a> {
    fn new(controller: &'a DashboardController, id: MutationId) -> Self {
        Self {
            controller,
            id: Some(id),
        }
    }

    fn disarm(mut self) {
        self.id = None;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.controller.orchestrator.abandon(id);
            self.controller.publish_status();
        }
    }
}

/// Headless dashboard core.
pub struct DashboardController {
    config: Arc<AppConfig>,
    reader: ChainStateReader,
    orchestrator: MutationOrchestrator,
    scheduler: Mutex<ReconciliationScheduler>,
    state: watch::Sender<DashboardSnapshot>,
}

impl DashboardController {
    /// Create a controller. The configuration is validated here, once.
    pub fn new(config: AppConfig, client: Arc<dyn LedgerClient>) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let (state, _) = watch::channel(DashboardSnapshot::default());
        Ok(Self {
            reader: ChainStateReader::new(client.clone(), config.clone()),
            orchestrator: MutationOrchestrator::new(client, config.clone()),
            scheduler: Mutex::new(ReconciliationScheduler::new()),
            config,
            state,
        })
    }

    /// Resolved configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.state.subscribe()
    }

    /// Label of the mint action for the current account.
    pub fn mint_label(&self) -> String {
        self.state.borrow().mint_label(self.config.mint_price)
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// Attach, replace, or detach the active account.
    ///
    /// Attaching runs a full refresh and returns once it has landed.
    pub async fn set_account(&self, account: Option<Address>) {
        let Some(account) = account else {
            self.disconnect();
            return;
        };

        let unchanged = self.scheduler.lock().owner() == Some(&account);
        if unchanged {
            return;
        }
        let epoch = self.scheduler.lock().reset_identity(Some(account.clone()));
        tracing::info!(%account, epoch, "Account attached");

        self.state.send_modify(|snapshot| {
            *snapshot = DashboardSnapshot::attached(account, snapshot.view);
        });
        self.signal(ChangeSignal::IdentityChanged).await;
    }

    /// Attach `account`.
    pub async fn connect(&self, account: Address) {
        self.set_account(Some(account)).await;
    }

    /// Detach the account, discarding every cached entity in one update.
    pub fn disconnect(&self) {
        let was_attached = {
            let mut scheduler = self.scheduler.lock();
            let attached = scheduler.owner().is_some();
            scheduler.reset_identity(None);
            attached
        };
        if was_attached {
            tracing::info!("Account detached");
        }

        let pending = self.orchestrator.pending_count();
        self.state.send_modify(|snapshot| {
            *snapshot = DashboardSnapshot {
                view: snapshot.view,
                ..DashboardSnapshot::default()
            };
            stamp_settled(snapshot, pending);
        });
    }

    /// Switch tables. Refreshes the balance only.
    pub async fn toggle_view(&self) {
        self.state.send_modify(|snapshot| snapshot.view = snapshot.view.toggled());
        self.signal(ChangeSignal::ViewToggled).await;
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Re-query every kind affected by `signal`, in parallel.
    ///
    /// Kinds already in flight are coalesced into a single follow-up run by
    /// whichever call dispatched them.
    pub async fn signal(&self, signal: ChangeSignal) {
        tracing::debug!(?signal, "Change signal");
        join_all(signal.kinds().iter().map(|kind| self.drive(*kind))).await;
    }

    /// Full refresh of the current identity.
    pub async fn refresh(&self) {
        self.signal(ChangeSignal::IdentityChanged).await;
    }

    async fn drive(&self, kind: RefreshKind) {
        let ticket = self.scheduler.lock().request(kind);
        let Some(mut ticket) = ticket else {
            return;
        };
        self.publish_status();

        loop {
            let guard = DispatchGuard::new(&self.scheduler, &ticket);
            let is_member = self.state.borrow().is_member;
            let payload = self.reader.fetch(kind, &ticket.owner, is_member).await;
            guard.disarm();

            let completion = self.scheduler.lock().complete(&ticket);
            if completion.apply {
                self.apply_payload(&ticket.owner, payload);
            }
            self.publish_status();

            match completion.follow_up {
                Some(next) => ticket = next,
                None => break,
            }
        }
    }

    /// Writes still in flight keep their optimistic effect on top of a
    /// refreshed access list, which may have been read before they executed.
    fn apply_payload(&self, owner: &Address, payload: RefreshPayload) {
        let mint_price = self.config.mint_price;
        let overlay = match payload.kind() {
            RefreshKind::AccessList => self.orchestrator.pending_effects(owner),
            _ => Vec::new(),
        };
        self.state.send_if_modified(|snapshot| {
            if snapshot.account.as_ref() != Some(owner) {
                return false;
            }
            let mut changed = payload.apply(snapshot, mint_price);
            for effect in &overlay {
                changed |= effect.apply(&mut snapshot.access_list);
            }
            changed
        });
    }

    fn publish_status(&self) {
        let in_flight = {
            let scheduler = self.scheduler.lock();
            scheduler.any_in_flight().then(|| scheduler.initial_sync_pending())
        };
        let pending = self.orchestrator.pending_count();
        self.state.send_if_modified(|snapshot| match in_flight {
            Some(initial) => stamp_syncing(snapshot, initial, pending),
            None => stamp_settled(snapshot, pending),
        });
    }

    // =========================================================================
    // User Actions
    // =========================================================================

    /// Add `address` to the whitelist under display name `name`.
    pub async fn grant_access(&self, address: &str, name: &str) -> Result<MutationReceipt, MutationError> {
        self.run_mutation(MutationRequest::GrantAccess {
            address: address.to_string(),
            name: name.to_string(),
        })
        .await
    }

    /// Remove `address` from the whitelist.
    pub async fn revoke_access(&self, address: &str) -> Result<MutationReceipt, MutationError> {
        self.run_mutation(MutationRequest::RevokeAccess {
            address: address.to_string(),
        })
        .await
    }

    /// Destroy an owned asset.
    pub async fn remove_asset(&self, object_id: &str) -> Result<MutationReceipt, MutationError> {
        self.run_mutation(MutationRequest::RemoveAsset {
            object_id: object_id.to_string(),
        })
        .await
    }

    /// Mint against a payment coin.
    pub async fn mint_paid(&self, request: MintRequest) -> Result<MutationReceipt, MutationError> {
        self.run_mutation(MutationRequest::MintPaid(request)).await
    }

    /// Mint through the whitelist allowance.
    pub async fn mint_free(&self, request: MintRequest) -> Result<MutationReceipt, MutationError> {
        self.run_mutation(MutationRequest::MintFree(request)).await
    }

    /// Mint for free when the account is whitelisted, against payment otherwise.
    pub async fn mint(&self, request: MintRequest) -> Result<MutationReceipt, MutationError> {
        let is_member = self.state.borrow().is_member;
        if is_member {
            self.mint_free(request).await
        } else {
            self.mint_paid(request).await
        }
    }

    /// Validate, apply the optimistic effect, submit, then reconcile.
    ///
    /// Every write that reached the ledger, successful or not, re-queries
    /// its affected kinds before returning.
    #[tracing::instrument(skip(self, request), fields(kind = %request.kind()))]
    pub async fn run_mutation(&self, request: MutationRequest) -> Result<MutationReceipt, MutationError> {
        let account = self.state.borrow().account.clone();
        let prepared = self
            .orchestrator
            .prepare(account.as_ref(), request)
            .map_err(|err| {
                tracing::warn!(error = %err, "Mutation refused");
                err
            })?;

        self.orchestrator.track(&prepared);
        let guard = PendingGuard::new(self, prepared.id);
        if let Some(effect) = &prepared.optimistic {
            let sender = &prepared.transaction.sender;
            self.state.send_if_modified(|snapshot| {
                snapshot.account.as_ref() == Some(sender) && effect.apply(&mut snapshot.access_list)
            });
        }
        self.publish_status();

        let result = self.orchestrator.submit(&prepared).await;
        guard.disarm();
        self.orchestrator.settle(prepared.id, &result);
        self.publish_status();

        if let Err(err) = &result {
            tracing::warn!(error = %err, "Mutation failed; re-querying affected state");
        }
        self.signal(prepared.kind.signal()).await;
        result
    }
}

fn stamp_syncing(snapshot: &mut DashboardSnapshot, initial: bool, pending: usize) -> bool {
    let before = (snapshot.phase, snapshot.loading, snapshot.pending_mutations);
    if snapshot.account.is_some() {
        snapshot.phase = SyncPhase::Synchronizing { initial };
        snapshot.loading = true;
    }
    snapshot.pending_mutations = pending;
    before != (snapshot.phase, snapshot.loading, snapshot.pending_mutations)
}

fn stamp_settled(snapshot: &mut DashboardSnapshot, pending: usize) -> bool {
    let before = (snapshot.phase, snapshot.loading, snapshot.pending_mutations);
    if snapshot.account.is_some() {
        snapshot.phase = SyncPhase::Synchronized;
        snapshot.loading = pending > 0;
    } else {
        snapshot.phase = SyncPhase::Disconnected;
        snapshot.loading = false;
    }
    snapshot.pending_mutations = pending;
    before != (snapshot.phase, snapshot.loading, snapshot.pending_mutations)
}
