mod common;

use common::Harness;
use keystone_core::{DiscountStatus, Money, OrderDetail, OrderItemInput, OrderUpdate};
use keystone_engine::ErrorKind;

async fn pending_order(h: &Harness) -> OrderDetail {
    let lamp = h.product("LAMP-1", 100, 10).await;
    h.order(&[(&lamp, 3)]).await
}

#[tokio::test]
async fn test_approval_lowers_total_only() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;
    let order_id = &detail.order.id;

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, order_id, Money::from_cents(30), "Loyal customer")
        .await
        .unwrap();
    assert_eq!(request.status, DiscountStatus::Pending);
    assert_eq!(request.requested_by, h.rep.id);

    // Nothing changes until a manager approves.
    let before = h.engine.orders().get_order(&h.rep, order_id).await.unwrap();
    assert_eq!(before.order.total_cents, 330);

    let approved = h
        .engine
        .discounts()
        .approve(&h.manager, &request.id, Some("fine"))
        .await
        .unwrap();
    assert_eq!(approved.status, DiscountStatus::Approved);
    assert_eq!(approved.reviewed_by.as_deref(), Some(h.manager.id.as_str()));
    assert_eq!(approved.review_notes.as_deref(), Some("fine"));
    assert!(approved.reviewed_at.is_some());

    let after = h.engine.orders().get_order(&h.rep, order_id).await.unwrap();
    assert_eq!(after.order.subtotal_cents, 300);
    assert_eq!(after.order.tax_cents, 30);
    assert_eq!(after.order.discount_cents, 30);
    assert_eq!(after.order.total_cents, 300);
}

#[tokio::test]
async fn test_resolved_request_cannot_be_resolved_again() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(30), "Loyal customer")
        .await
        .unwrap();
    h.engine.discounts().approve(&h.manager, &request.id, None).await.unwrap();

    let err = h
        .engine
        .discounts()
        .approve(&h.manager, &request.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = h
        .engine
        .discounts()
        .reject(&h.manager, &request.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let after = h.engine.orders().get_order(&h.rep, &detail.order.id).await.unwrap();
    assert_eq!(after.order.total_cents, 300);
}

#[tokio::test]
async fn test_rejection_leaves_order_untouched() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(50), "Dented box")
        .await
        .unwrap();
    let rejected = h
        .engine
        .discounts()
        .reject(&h.manager, &request.id, Some("no"))
        .await
        .unwrap();
    assert_eq!(rejected.status, DiscountStatus::Rejected);

    let after = h.engine.orders().get_order(&h.rep, &detail.order.id).await.unwrap();
    assert_eq!(after.order.discount_cents, 0);
    assert_eq!(after.order.total_cents, 330);

    let err = h
        .engine
        .discounts()
        .approve(&h.manager, &request.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_second_approval_on_same_order_fails() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;
    let order_id = &detail.order.id;

    let first = h
        .engine
        .discounts()
        .create_request(&h.rep, order_id, Money::from_cents(30), "Loyal customer")
        .await
        .unwrap();
    let second = h
        .engine
        .discounts()
        .create_request(&h.rep, order_id, Money::from_cents(20), "Also loyal")
        .await
        .unwrap();

    h.engine.discounts().approve(&h.manager, &first.id, None).await.unwrap();
    let err = h
        .engine
        .discounts()
        .approve(&h.manager, &second.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // The failed approval rolled back with its order update.
    let still = h.engine.discounts().get(&h.rep, &second.id).await.unwrap();
    assert_eq!(still.status, DiscountStatus::Pending);
    let after = h.engine.orders().get_order(&h.rep, order_id).await.unwrap();
    assert_eq!(after.order.total_cents, 300);
}

#[tokio::test]
async fn test_discount_amount_bounds() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;
    let order_id = &detail.order.id;

    for cents in [0, -5, 331] {
        let err = h
            .engine
            .discounts()
            .create_request(&h.rep, order_id, Money::from_cents(cents), "Loyal customer")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "amount {}", cents);
    }

    // The whole total is allowed.
    h.engine
        .discounts()
        .create_request(&h.rep, order_id, Money::from_cents(330), "Goodwill")
        .await
        .unwrap();

    let err = h
        .engine
        .discounts()
        .create_request(&h.rep, order_id, Money::from_cents(10), "   ")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_request_requires_pending_order() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;
    h.engine.orders().submit_order(&h.rep, &detail.order.id).await.unwrap();

    let err = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(10), "Late ask")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn test_approval_after_submit_fails() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(10), "Loyal customer")
        .await
        .unwrap();
    h.engine.orders().submit_order(&h.rep, &detail.order.id).await.unwrap();

    let err = h
        .engine
        .discounts()
        .approve(&h.manager, &request.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let still = h.engine.discounts().get(&h.manager, &request.id).await.unwrap();
    assert_eq!(still.status, DiscountStatus::Pending);
}

#[tokio::test]
async fn test_discount_survives_line_update() {
    let h = Harness::new().await;
    let lamp = h.product("LAMP-1", 100, 10).await;
    let detail = h.order(&[(&lamp, 3)]).await;

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(30), "Loyal customer")
        .await
        .unwrap();
    h.engine.discounts().approve(&h.manager, &request.id, None).await.unwrap();

    let updated = h
        .engine
        .orders()
        .update_order(
            &h.rep,
            &detail.order.id,
            OrderUpdate {
                items: Some(vec![OrderItemInput::new(&lamp.id, 5)]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.order.subtotal_cents, 500);
    assert_eq!(updated.order.tax_cents, 50);
    assert_eq!(updated.order.discount_cents, 30);
    assert_eq!(updated.order.total_cents, 520);
}

#[tokio::test]
async fn test_discount_authorization() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;

    let err = h
        .engine
        .discounts()
        .create_request(&h.other_rep, &detail.order.id, Money::from_cents(10), "Not mine")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(10), "Loyal customer")
        .await
        .unwrap();

    let err = h.engine.discounts().approve(&h.rep, &request.id, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = h.engine.discounts().reject(&h.rep, &request.id, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h.engine.discounts().get(&h.other_rep, &request.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h.engine.discounts().list(&h.rep, None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = h
        .engine
        .discounts()
        .list(&h.other_rep, None, Some(&detail.order.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let own = h
        .engine
        .discounts()
        .list(&h.rep, None, Some(&detail.order.id))
        .await
        .unwrap();
    assert_eq!(own.len(), 1);

    let pending = h
        .engine
        .discounts()
        .list(&h.manager, Some(DiscountStatus::Pending), None)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, request.id);
}

#[tokio::test]
async fn test_deleting_order_removes_requests() {
    let h = Harness::new().await;
    let detail = pending_order(&h).await;

    let request = h
        .engine
        .discounts()
        .create_request(&h.rep, &detail.order.id, Money::from_cents(10), "Loyal customer")
        .await
        .unwrap();
    h.engine.orders().delete_order(&h.rep, &detail.order.id).await.unwrap();

    let err = h.engine.discounts().get(&h.manager, &request.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
