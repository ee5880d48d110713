//! Refresh coalescing, stale-response discard, and sync phases under interleaving.
#![allow(missing_docs)]

use ledgerdash_app::{ChangeSignal, SyncPhase};
use ledgerdash_testkit::*;

#[tokio::test]
async fn rapid_removal_signals_coalesce_into_one_extra_refresh() {
    let mut assets = Vec::new();
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        assets.push(ledger.seed_asset(&alice(), "Fern"));
        assets.push(ledger.seed_asset(&alice(), "Moss"));
    });
    h.controller.connect(alice()).await;
    assert_eq!(h.controller.snapshot().assets.len(), 2);

    let gate = h.ledger.hold(LedgerOp::OwnedObjects);
    let before = h.ledger.calls(LedgerOp::OwnedObjects);

    tokio::join!(h.controller.signal(ChangeSignal::AssetsChanged), async {
        gate.wait_for_arrivals(1).await;
        h.controller.remove_asset(assets[0].as_str()).await.unwrap();
        h.controller.remove_asset(assets[1].as_str()).await.unwrap();
        assert_eq!(h.ledger.calls(LedgerOp::OwnedObjects), before + 1);
        gate.open();
    });

    assert_eq!(h.ledger.calls(LedgerOp::OwnedObjects), before + 2);
    assert!(h.controller.snapshot().assets.is_empty());
}

#[tokio::test]
async fn response_for_superseded_identity_is_discarded() {
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        ledger.fund(&bob(), 3_000_000_000);
    });
    let gate = h.ledger.hold_for(LedgerOp::Balance, &alice());

    tokio::join!(h.controller.connect(alice()), async {
        gate.wait_for_arrivals(1).await;
        h.controller.connect(bob()).await;
        assert_eq!(h.controller.snapshot().balance.mist(), 3_000_000_000);
        gate.open();
    });

    let snap = h.controller.snapshot();
    assert_eq!(snap.account, Some(bob()));
    assert_eq!(snap.balance.mist(), 3_000_000_000);
    assert_eq!(h.ledger.calls(LedgerOp::Balance), 2);
}

#[tokio::test]
async fn response_after_disconnect_is_discarded() {
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        ledger.seed_asset(&alice(), "Fern");
    });
    let gate = h.ledger.hold(LedgerOp::Balance);

    tokio::join!(h.controller.connect(alice()), async {
        gate.wait_for_arrivals(1).await;
        h.controller.disconnect();
        gate.open();
    });

    let snap = h.controller.snapshot();
    assert_eq!(snap.account, None);
    assert_eq!(snap.phase, SyncPhase::Disconnected);
    assert_eq!(snap.balance.mist(), 0);
    assert!(snap.assets.is_empty());
}

#[tokio::test]
async fn phases_follow_initial_and_partial_refreshes() {
    let h = TestHarness::standard();
    let initial_gate = h.ledger.hold(LedgerOp::Balance);

    tokio::join!(h.controller.connect(alice()), async {
        initial_gate.wait_for_arrivals(1).await;
        let snap = h.controller.snapshot();
        assert_eq!(snap.phase, SyncPhase::Synchronizing { initial: true });
        assert!(snap.loading);
        assert_eq!(snap.balance_label(), "Loading...");
        initial_gate.open();
    });
    assert_eq!(h.controller.snapshot().phase, SyncPhase::Synchronized);

    let partial_gate = h.ledger.hold(LedgerOp::Balance);
    tokio::join!(h.controller.toggle_view(), async {
        partial_gate.wait_for_arrivals(1).await;
        let snap = h.controller.snapshot();
        assert_eq!(snap.phase, SyncPhase::Synchronizing { initial: false });
        assert!(snap.is_admin);
        partial_gate.open();
    });

    let snap = h.controller.snapshot();
    assert_eq!(snap.phase, SyncPhase::Synchronized);
    assert!(!snap.loading);
}

#[tokio::test]
async fn independent_kinds_do_not_wait_on_each_other() {
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        ledger.seed_asset(&alice(), "Fern");
    });
    let gate = h.ledger.hold(LedgerOp::Balance);

    tokio::join!(h.controller.connect(alice()), async {
        gate.wait_for_arrivals(1).await;
        let snap = h.controller.snapshot();
        assert_eq!(snap.assets.len(), 1);
        assert!(snap.is_admin);
        assert_eq!(snap.access_list.len(), 1);
        assert_eq!(snap.balance.mist(), 0);
        gate.open();
    });

    assert_eq!(h.controller.snapshot().balance.mist(), STARTING_BALANCE);
}

#[tokio::test]
async fn refresh_landing_mid_write_keeps_optimistic_entries() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    let (bob, carol) = (bob(), carol());
    let gate = h.ledger.hold(LedgerOp::Execute);

    let (granted, ()) = tokio::join!(h.controller.grant_access(carol.as_str(), "Carol"), async {
        gate.wait_for_arrivals(1).await;
        h.controller.signal(ChangeSignal::AccessChanged).await;
        let snap = h.controller.snapshot();
        assert_eq!(snap.access_list.get(&carol).unwrap().name, "Carol");
        assert!(snap.access_list.contains(&bob));
        gate.open();
    });

    granted.unwrap();
    let snap = h.controller.snapshot();
    assert!(snap.access_list.contains(&carol));
    assert_eq!(snap.pending_mutations, 0);
}

#[tokio::test]
async fn settled_failure_is_not_reapplied_by_later_refreshes() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    h.ledger.abort_next_execution("ENotWhitelisted");
    let bob = bob();

    h.controller.revoke_access(bob.as_str()).await.unwrap_err();
    h.controller.signal(ChangeSignal::AccessChanged).await;

    assert!(h.controller.snapshot().access_list.contains(&bob));
}
