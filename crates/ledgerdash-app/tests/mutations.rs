//! User-triggered writes: optimistic effects, outcomes, and corrective refreshes.
#![allow(missing_docs)]

use assert_matches::assert_matches;
use ledgerdash_app::{ErrorCategory, LedgerError, MintRequest, MutationError, MutationKind, SyncPhase};
use ledgerdash_testkit::*;

fn mint_request() -> MintRequest {
    MintRequest::new("Fern", "https://img/fern.png", "A green fern")
}

// ============================================================================
// Access List
// ============================================================================

#[tokio::test]
async fn grant_shows_entry_immediately_and_after_refresh() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    let carol = carol();
    let gate = h.ledger.hold(LedgerOp::Execute);

    let (result, ()) = tokio::join!(
        h.controller.grant_access(carol.as_str(), "Carol"),
        async {
            gate.wait_for_arrivals(1).await;
            let during = h.controller.snapshot();
            assert_eq!(during.access_list.get(&carol).unwrap().name, "Carol");
            assert_eq!(during.pending_mutations, 1);
            assert!(during.loading);
            gate.open();
        }
    );

    let receipt = result.unwrap();
    assert_eq!(receipt.kind, MutationKind::GrantAccess);
    assert_eq!(receipt.message, "Address added to whitelist successfully!");

    let after = h.controller.snapshot();
    assert!(after.access_list.contains(&carol));
    assert_eq!(after.pending_mutations, 0);
    assert!(!after.loading);
    assert!(h.ledger.is_whitelisted(&carol));
}

#[tokio::test]
async fn revoke_hides_entry_immediately_and_after_refresh() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    let bob = bob();
    let gate = h.ledger.hold(LedgerOp::Execute);

    let (result, ()) = tokio::join!(h.controller.revoke_access(bob.as_str()), async {
        gate.wait_for_arrivals(1).await;
        assert!(!h.controller.snapshot().access_list.contains(&bob));
        gate.open();
    });

    assert_eq!(
        result.unwrap().message,
        "Address removed from whitelist successfully!"
    );
    assert!(!h.controller.snapshot().access_list.contains(&bob));
    assert!(!h.ledger.is_whitelisted(&bob));
}

#[tokio::test]
async fn revoke_of_padded_address_hides_the_canonical_entry() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    let bob = bob();
    let padded = format!("0x{:0>64}", "B0B");
    let gate = h.ledger.hold(LedgerOp::Execute);

    let (result, ()) = tokio::join!(h.controller.revoke_access(&padded), async {
        gate.wait_for_arrivals(1).await;
        assert!(!h.controller.snapshot().access_list.contains(&bob));
        gate.open();
    });

    result.unwrap();
    assert!(!h.ledger.is_whitelisted(&bob));
    assert!(!h.controller.snapshot().access_list.contains(&bob));
}

#[tokio::test]
async fn failed_revoke_is_restored_by_corrective_refresh() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    h.ledger.abort_next_execution("MoveAbort(remove_from_whitelist, 3)");
    let bob = bob();
    let gate = h.ledger.hold(LedgerOp::Execute);

    let (result, ()) = tokio::join!(h.controller.revoke_access(bob.as_str()), async {
        gate.wait_for_arrivals(1).await;
        assert!(!h.controller.snapshot().access_list.contains(&bob));
        gate.open();
    });

    let err = result.unwrap_err();
    assert_matches!(err, MutationError::Submission { kind: MutationKind::RevokeAccess, .. });
    assert!(err
        .user_message()
        .starts_with("Failed to remove from whitelist."));
    assert!(h.controller.snapshot().access_list.contains(&bob));
}

#[tokio::test]
async fn non_admin_grant_is_rejected_on_ledger() {
    let h = TestHarness::standard();
    h.controller.connect(bob()).await;
    assert!(!h.controller.snapshot().can_manage_access());

    let err = h
        .controller
        .grant_access(carol().as_str(), "Carol")
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Operation);
    assert!(!h.controller.snapshot().access_list.contains(&carol()));
}

#[tokio::test]
async fn grant_with_empty_name_makes_no_remote_call() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;
    let before = h.controller.snapshot();
    let reads = h.ledger.calls(LedgerOp::DynamicFields);

    let err = h
        .controller
        .grant_access(carol().as_str(), "")
        .await
        .unwrap_err();

    assert_matches!(err, MutationError::Validation { .. });
    assert_eq!(
        err.user_message(),
        "Please fill in all the whitelist details before adding."
    );
    assert_eq!(h.ledger.calls(LedgerOp::Execute), 0);
    assert_eq!(h.ledger.calls(LedgerOp::DynamicFields), reads);
    assert_eq!(h.controller.snapshot(), before);
}

#[tokio::test]
async fn mutations_without_an_account_are_refused() {
    let h = TestHarness::standard();
    let err = h.controller.mint_paid(mint_request()).await.unwrap_err();
    assert!(err.category().is_user_correctable());
    assert!(!err.reached_ledger());
    assert_eq!(h.ledger.calls(LedgerOp::Execute), 0);
}

// ============================================================================
// Assets
// ============================================================================

#[tokio::test]
async fn removed_asset_stays_until_confirmed() {
    let mut asset = None;
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        asset = Some(ledger.seed_asset(&alice(), "Fern"));
    });
    let asset = asset.unwrap();
    h.controller.connect(alice()).await;
    let gate = h.ledger.hold(LedgerOp::Execute);

    let (result, ()) = tokio::join!(h.controller.remove_asset(asset.as_str()), async {
        gate.wait_for_arrivals(1).await;
        assert!(h.controller.snapshot().asset(&asset).is_some());
        gate.open();
    });

    let receipt = result.unwrap();
    assert_eq!(receipt.deleted, vec![asset.clone()]);
    assert!(h.controller.snapshot().asset(&asset).is_none());
}

#[tokio::test]
async fn failed_removal_keeps_the_asset() {
    let mut asset = None;
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        asset = Some(ledger.seed_asset(&alice(), "Fern"));
    });
    let asset = asset.unwrap();
    h.controller.connect(alice()).await;
    h.ledger
        .fail_next(LedgerOp::Execute, LedgerError::Transport("connection reset".into()));

    let err = h.controller.remove_asset(asset.as_str()).await.unwrap_err();

    assert_matches!(err, MutationError::Network { .. });
    assert!(err.category().is_transient());
    assert_eq!(err.user_message(), "Failed to remove NFT. Check your network connection and retry");
    assert!(h.controller.snapshot().asset(&asset).is_some());
}

#[tokio::test]
async fn balance_is_refreshed_after_success_and_failure() {
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        ledger.seed_asset(&alice(), "Fern");
    });
    h.controller.connect(alice()).await;

    h.controller.mint_paid(mint_request()).await.unwrap();
    assert_eq!(
        h.controller.snapshot().balance.mist(),
        h.ledger.balance_of(&alice())
    );

    h.ledger.abort_next_execution("EInsufficientPayment");
    h.controller.mint_paid(mint_request()).await.unwrap_err();
    assert_eq!(
        h.controller.snapshot().balance.mist(),
        h.ledger.balance_of(&alice())
    );
    assert_eq!(
        h.ledger.balance_of(&alice()),
        STARTING_BALANCE - test_config().mint_price - 2 * SIMULATED_GAS_FEE
    );
}

#[tokio::test]
async fn mint_routes_by_membership() {
    let h = TestHarness::standard();

    h.controller.connect(bob()).await;
    let receipt = h.controller.mint(mint_request()).await.unwrap();
    assert_eq!(receipt.kind, MutationKind::MintFree);
    assert_eq!(receipt.created.len(), 1);
    let snap = h.controller.snapshot();
    assert_eq!(snap.assets.len(), 1);
    assert_eq!(snap.assets[0].object_id, receipt.created[0]);
    assert_eq!(snap.assets[0].name, "Fern");
    assert_eq!(snap.assets[0].price.to_string(), "Free");
    assert_eq!(snap.balance.mist(), STARTING_BALANCE - SIMULATED_GAS_FEE);

    h.controller.connect(alice()).await;
    let receipt = h.controller.mint(mint_request()).await.unwrap();
    assert_eq!(receipt.kind, MutationKind::MintPaid);
    assert_eq!(receipt.message, "Paid mint successful!");
    let snap = h.controller.snapshot();
    assert_eq!(snap.assets[0].price.to_string(), "2 SUI");
    assert_eq!(
        snap.balance.mist(),
        STARTING_BALANCE - test_config().mint_price - SIMULATED_GAS_FEE
    );
}

#[tokio::test]
async fn free_mint_for_non_member_fails_with_hint() {
    let h = TestHarness::standard();
    h.controller.connect(alice()).await;

    let err = h.controller.mint_free(mint_request()).await.unwrap_err();

    assert!(err
        .user_message()
        .starts_with("Failed to mint NFT. You may not be whitelisted"));
    assert!(h.controller.snapshot().assets.is_empty());
}

#[tokio::test]
async fn incomplete_mint_is_refused_locally() {
    let h = TestHarness::standard();
    h.controller.connect(bob()).await;

    let err = h
        .controller
        .mint(MintRequest::new("Fern", "https://img/fern.png", " "))
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Please fill in all the NFT details before minting."
    );
    assert_eq!(h.ledger.calls(LedgerOp::Execute), 0);
}

#[tokio::test]
async fn dropped_write_does_not_leave_the_dashboard_loading() {
    let mut asset = None;
    let h = TestHarness::with_ledger(|ledger| {
        seed_standard(ledger);
        asset = Some(ledger.seed_asset(&alice(), "Fern"));
    });
    let asset = asset.unwrap();
    h.controller.connect(alice()).await;
    let gate = h.ledger.hold(LedgerOp::Execute);

    tokio::select! {
        _ = h.controller.remove_asset(asset.as_str()) => panic!("removal resolved while execution was held"),
        () = gate.wait_for_arrivals(1) => {}
    }

    let snap = h.controller.snapshot();
    assert_eq!(snap.pending_mutations, 0);
    assert!(!snap.loading);
    assert_eq!(snap.phase, SyncPhase::Synchronized);

    gate.open();
    h.controller.toggle_view().await;
    h.controller.refresh().await;
    let snap = h.controller.snapshot();
    assert!(!snap.loading);
    assert_eq!(snap.balance_label(), "Balance: 10.000 SUI");
}
