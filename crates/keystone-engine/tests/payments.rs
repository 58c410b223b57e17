mod common;

use common::Harness;
use keystone_core::{OrderDetail, OrderStatus, PaymentMeta, PaymentMethod, PaymentStatus};
use keystone_engine::ErrorKind;

async fn submitted_order(h: &Harness) -> OrderDetail {
    let lamp = h.product("LAMP-1", 100, 10).await;
    let detail = h.order(&[(&lamp, 3)]).await;
    h.engine.orders().submit_order(&h.rep, &detail.order.id).await.unwrap();
    detail
}

fn cash() -> PaymentMeta {
    PaymentMeta {
        reference: Some("till-3".to_string()),
        notes: None,
    }
}

#[tokio::test]
async fn test_confirm_pays_order_and_issues_receipt() {
    let h = Harness::new().await;
    let detail = submitted_order(&h).await;
    let order_id = &detail.order.id;

    let payment = h
        .engine
        .payments()
        .create_payment(&h.rep, order_id, PaymentMethod::Cash, cash())
        .await
        .unwrap();
    assert_eq!(payment.payment_status, PaymentStatus::Pending);
    assert_eq!(payment.amount_cents, 330);
    assert_eq!(payment.created_by, h.rep.id);

    let confirmed = h
        .engine
        .payments()
        .confirm_payment(&h.manager, &payment.id)
        .await
        .unwrap();
    assert_eq!(confirmed.payment_status, PaymentStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());
    assert_eq!(h.issuer.calls(), 1);

    let paid = h.engine.orders().get_order(&h.rep, order_id).await.unwrap();
    assert_eq!(paid.order.status, OrderStatus::Paid);
    assert!(paid.order.paid_at.is_some());

    let receipt = h.engine.payments().receipt(&h.rep, &payment.id).await.unwrap();
    assert_eq!(receipt.document_ref, "TEST-RCPT-1");
    assert_eq!(&receipt.order_id, order_id);
}

#[tokio::test]
async fn test_payment_requires_submitted_order() {
    let h = Harness::new().await;
    let lamp = h.product("LAMP-1", 100, 10).await;
    let detail = h.order(&[(&lamp, 1)]).await;

    let err = h
        .engine
        .payments()
        .create_payment(&h.rep, &detail.order.id, PaymentMethod::Card, PaymentMeta::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = h
        .engine
        .payments()
        .create_payment(&h.rep, "missing", PaymentMethod::Card, PaymentMeta::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_second_payment_conflicts() {
    let h = Harness::new().await;
    let detail = submitted_order(&h).await;

    h.engine
        .payments()
        .create_payment(&h.rep, &detail.order.id, PaymentMethod::Cash, cash())
        .await
        .unwrap();

    let err = h
        .engine
        .payments()
        .create_payment(&h.rep, &detail.order.id, PaymentMethod::Card, PaymentMeta::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_double_confirm_issues_once() {
    let h = Harness::new().await;
    let detail = submitted_order(&h).await;
    let payment = h
        .engine
        .payments()
        .create_payment(&h.rep, &detail.order.id, PaymentMethod::Cash, cash())
        .await
        .unwrap();

    h.engine.payments().confirm_payment(&h.manager, &payment.id).await.unwrap();
    let err = h
        .engine
        .payments()
        .confirm_payment(&h.manager, &payment.id)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(h.issuer.calls(), 1);
}

#[tokio::test]
async fn test_issuer_failure_rolls_back_confirmation() {
    let h = Harness::new().await;
    let detail = submitted_order(&h).await;
    let payment = h
        .engine
        .payments()
        .create_payment(&h.rep, &detail.order.id, PaymentMethod::Cash, cash())
        .await
        .unwrap();

    h.issuer.set_failing(true);
    let err = h
        .engine
        .payments()
        .confirm_payment(&h.manager, &payment.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(err.to_body().message, "Receipt could not be issued");

    let still = h.engine.payments().get(&h.manager, &payment.id).await.unwrap();
    assert_eq!(still.payment_status, PaymentStatus::Pending);
    assert!(still.confirmed_at.is_none());

    let order = h.engine.orders().get_order(&h.manager, &detail.order.id).await.unwrap();
    assert_eq!(order.order.status, OrderStatus::Submitted);

    let err = h.engine.payments().receipt(&h.manager, &payment.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // A retry once the issuer recovers goes through.
    h.issuer.set_failing(false);
    h.engine.payments().confirm_payment(&h.manager, &payment.id).await.unwrap();
    assert_eq!(h.issuer.calls(), 2);

    let order = h.engine.orders().get_order(&h.manager, &detail.order.id).await.unwrap();
    assert_eq!(order.order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_payment_authorization() {
    let h = Harness::new().await;
    let detail = submitted_order(&h).await;

    let err = h
        .engine
        .payments()
        .create_payment(&h.other_rep, &detail.order.id, PaymentMethod::Cash, cash())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let payment = h
        .engine
        .payments()
        .create_payment(&h.rep, &detail.order.id, PaymentMethod::Cash, cash())
        .await
        .unwrap();

    let err = h
        .engine
        .payments()
        .confirm_payment(&h.other_rep, &payment.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(h.issuer.calls(), 0);

    let err = h.engine.payments().get(&h.other_rep, &payment.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_payment_meta_is_validated() {
    let h = Harness::new().await;
    let detail = submitted_order(&h).await;

    let err = h
        .engine
        .payments()
        .create_payment(
            &h.rep,
            &detail.order.id,
            PaymentMethod::BankTransfer,
            PaymentMeta {
                reference: Some("x".repeat(101)),
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
