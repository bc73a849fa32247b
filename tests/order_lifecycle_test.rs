//! End-to-end order lifecycle: draft, confirm, fulfill, and the
//! all-or-nothing stock check on sales fulfillment.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use gudang_core::errors::ServiceError;
use gudang_core::models::{OrderStatus, OrderType, PartnerType, TransactionType};
use gudang_core::services::{ItemDraft, OrderDraft};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn order_draft(
    order_type: OrderType,
    partner_id: Uuid,
    lines: &[(Uuid, i64, rust_decimal::Decimal)],
) -> OrderDraft {
    OrderDraft {
        order_type,
        partner_id,
        date: Utc::now().date_naive(),
        expected_date: None,
        order_number: None,
        notes: String::new(),
        items: lines
            .iter()
            .map(|(product_id, quantity, price)| ItemDraft {
                product_id: *product_id,
                quantity: *quantity,
                price_per_unit: *price,
            })
            .collect(),
    }
}

#[test]
fn widget_purchase_then_oversold_sales() {
    // The full scenario: a new product is purchased into stock through a PO,
    // then a sales order for more than is on hand must be refused.
    let app = TestApp::new();
    let services = &app.state.services;

    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 0);
    let supplier = app.seed_partner("CV Sumber Baja", PartnerType::Supplier);
    let customer = app.seed_partner("Toko Jaya", PartnerType::Customer);

    // Draft and confirm a PO for 20 units.
    let po = services
        .orders
        .create(order_draft(
            OrderType::Purchase,
            supplier.id,
            &[(widget.id, 20, dec!(1000))],
        ))
        .unwrap();
    assert_eq!(po.status, OrderStatus::Draft);
    assert_eq!(app.stock_of(widget.id), 0);

    let po = services.orders.confirm(po.id).unwrap();
    assert_eq!(po.status, OrderStatus::Open);
    assert_eq!(app.stock_of(widget.id), 0);

    // Fulfillment receives the goods.
    let (po, receipt) = services.orders.fulfill(po.id).unwrap();
    assert_eq!(po.status, OrderStatus::Completed);
    assert_eq!(po.related_transaction_id, Some(receipt.id));
    assert_eq!(receipt.tx_type, TransactionType::Inbound);
    assert_eq!(receipt.quantity_of(widget.id), 20);
    assert_eq!(receipt.reference_no, po.order_number);
    assert_eq!(app.stock_of(widget.id), 20);

    // An SO for 25 units cannot be fulfilled from 20.
    let so = services
        .orders
        .create(order_draft(
            OrderType::Sales,
            customer.id,
            &[(widget.id, 25, dec!(1500))],
        ))
        .unwrap();
    let so = services.orders.confirm(so.id).unwrap();

    let err = services.orders.fulfill(so.id).unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(lines) => {
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].requested, 25);
        assert_eq!(lines[0].available, 20);
    });
    assert_eq!(app.stock_of(widget.id), 20);
    assert_eq!(
        services.orders.get(so.id).unwrap().status,
        OrderStatus::Open
    );
}

#[test]
fn two_line_sales_fulfillment_is_all_or_nothing() {
    let app = TestApp::new();
    let services = &app.state.services;

    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 50);
    let bracket = app.seed_product("B1", "Bracket", 5, dec!(500), 2);
    let customer = app.seed_partner("Toko Jaya", PartnerType::Customer);

    let so = services
        .orders
        .create(order_draft(
            OrderType::Sales,
            customer.id,
            &[(widget.id, 10, dec!(1000)), (bracket.id, 5, dec!(500))],
        ))
        .unwrap();
    let so = services.orders.confirm(so.id).unwrap();

    assert_matches!(
        services.orders.fulfill(so.id),
        Err(ServiceError::InsufficientStock(_))
    );

    // Neither line moved, no transaction was synthesized, status unchanged.
    assert_eq!(app.stock_of(widget.id), 50);
    assert_eq!(app.stock_of(bracket.id), 2);
    assert!(services.transactions.list().is_empty());
    assert_eq!(
        services.orders.get(so.id).unwrap().status,
        OrderStatus::Open
    );
}

#[test]
fn cancellation_is_free_of_stock_effects_from_any_active_state() {
    let app = TestApp::new();
    let services = &app.state.services;

    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 10);
    let supplier = app.seed_partner("CV Sumber Baja", PartnerType::Supplier);

    // Cancel from Draft.
    let draft_po = services
        .orders
        .create(order_draft(
            OrderType::Purchase,
            supplier.id,
            &[(widget.id, 5, dec!(1000))],
        ))
        .unwrap();
    services.orders.cancel(draft_po.id).unwrap();

    // Cancel from Open.
    let open_po = services
        .orders
        .create(order_draft(
            OrderType::Purchase,
            supplier.id,
            &[(widget.id, 5, dec!(1000))],
        ))
        .unwrap();
    services.orders.confirm(open_po.id).unwrap();
    let cancelled = services.orders.cancel(open_po.id).unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    assert_eq!(app.stock_of(widget.id), 10);
    assert!(services.transactions.list().is_empty());

    // Terminal states refuse everything.
    assert_matches!(
        services.orders.fulfill(cancelled.id),
        Err(ServiceError::InvalidStatus(_))
    );
}

#[test]
fn fulfilled_purchase_shows_up_in_the_ledger_and_reports() {
    let app = TestApp::new();
    let services = &app.state.services;

    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 0);
    let supplier = app.seed_partner("CV Sumber Baja", PartnerType::Supplier);

    let po = services
        .orders
        .create(order_draft(
            OrderType::Purchase,
            supplier.id,
            &[(widget.id, 20, dec!(1000))],
        ))
        .unwrap();
    services.orders.confirm(po.id).unwrap();
    services.orders.fulfill(po.id).unwrap();

    let stats = services.reports.dashboard_stats();
    assert_eq!(stats.inbound_count, 1);
    assert_eq!(stats.outbound_count, 0);
    assert_eq!(stats.total_stock_value, dec!(20000));

    let activity = services.reports.recent_activity(10);
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].reference_no, po.order_number);
}

#[test]
fn deleting_the_fulfillment_transaction_reverses_the_receipt() {
    // The ledger does not special-case order-born transactions: deleting the
    // linked transaction reverses its stock effect like any other.
    let app = TestApp::new();
    let services = &app.state.services;

    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 0);
    let supplier = app.seed_partner("CV Sumber Baja", PartnerType::Supplier);

    let po = services
        .orders
        .create(order_draft(
            OrderType::Purchase,
            supplier.id,
            &[(widget.id, 20, dec!(1000))],
        ))
        .unwrap();
    services.orders.confirm(po.id).unwrap();
    let (_, receipt) = services.orders.fulfill(po.id).unwrap();
    assert_eq!(app.stock_of(widget.id), 20);

    assert!(services.transactions.delete(receipt.id).unwrap());
    assert_eq!(app.stock_of(widget.id), 0);

    // The order still points at the now-gone transaction; the dangling
    // reference is a lookup miss, not an error.
    let po = services.orders.get(po.id).unwrap();
    assert_eq!(po.related_transaction_id, Some(receipt.id));
    assert!(services.transactions.get(receipt.id).is_none());
}
