//! # Back Office Walkthrough
//!
//! Runs one order through its whole lifecycle against the configured
//! database and prints each step.
//!
//! ## Usage
//! ```bash
//! KEYSTONE_DB_PATH=./demo.db cargo run -p keystone-engine --bin backoffice
//!
//! # More log detail
//! RUST_LOG=debug cargo run -p keystone-engine --bin backoffice
//! ```
//!
//! ## Steps
//! 1. Ensure a demo product exists (price $1.00, stock 10)
//! 2. Sales rep creates an order for 3 units → subtotal $3.00, tax $0.30, total $3.30
//! 3. Rep requests a $0.30 discount, manager approves → total $3.00
//! 4. Rep submits, records a card payment, manager confirms → order paid, receipt issued

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use keystone_core::{
    Caller, CustomerInfo, Money, NewOrder, OrderItemInput, PaymentMeta, PaymentMethod,
};
use keystone_db::repository::product;
use keystone_engine::{init_tracing, Engine, EngineConfig, SequentialReceiptIssuer};

const DEMO_SKU: &str = "DEMO-LAMP";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = EngineConfig::from_env().context("loading configuration")?;
    info!(
        db_path = %config.db_path.display(),
        tax_rate_bps = config.tax_rate.bps(),
        "Configuration loaded"
    );

    let engine = Engine::open(config, Arc::new(SequentialReceiptIssuer::new()))
        .await
        .context("opening database")?;

    let admin = Caller::admin("admin-1");
    let manager = Caller::manager("manager-1");
    let rep = Caller::sales_rep("rep-1");

    // 1. Catalog
    let lamp = match product::get_by_sku(engine.database().pool(), DEMO_SKU).await? {
        Some(p) => p,
        None => engine
            .inventory()
            .add_product(&admin, DEMO_SKU, "Demo Desk Lamp", 100, 10, 2)
            .await?,
    };
    println!("Product {} on hand: {}", lamp.sku, lamp.quantity);

    // 2. Order
    let created = engine
        .orders()
        .create_order(
            &rep,
            NewOrder {
                customer: CustomerInfo::named("Walk-in Customer"),
                items: vec![OrderItemInput::new(&lamp.id, 3)],
                notes: None,
            },
        )
        .await?;
    let order_id = created.order.id.clone();
    println!(
        "Order {} created: subtotal {} tax {} total {}",
        created.order.order_number,
        Money::from_cents(created.order.subtotal_cents),
        Money::from_cents(created.order.tax_cents),
        created.order.total(),
    );

    // 3. Discount
    let request = engine
        .discounts()
        .create_request(&rep, &order_id, Money::from_cents(30), "Loyal customer")
        .await?;
    engine
        .discounts()
        .approve(&manager, &request.id, Some("ok"))
        .await?;
    let discounted = engine.orders().get_order(&rep, &order_id).await?;
    println!("Discount approved: total now {}", discounted.order.total());

    // 4. Payment
    engine.orders().submit_order(&rep, &order_id).await?;
    let payment = engine
        .payments()
        .create_payment(&rep, &order_id, PaymentMethod::Card, PaymentMeta::default())
        .await?;
    let confirmed = engine
        .payments()
        .confirm_payment(&manager, &payment.id)
        .await?;
    let receipt = engine.payments().receipt(&manager, &payment.id).await?;
    println!(
        "Payment {} confirmed for {}, receipt {}",
        confirmed.id,
        confirmed.amount(),
        receipt.document_ref
    );

    let paid = engine.orders().get_order(&manager, &order_id).await?;
    println!("{}", serde_json::to_string_pretty(&paid)?);

    let after = engine.inventory().get(&rep, &lamp.id).await?;
    println!("Product {} on hand: {}", after.sku, after.quantity);

    engine.database().close().await;
    Ok(())
}
