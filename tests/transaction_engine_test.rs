//! Ledger engine properties: reversal round-trips, edit correctness, and
//! the availability rule shared by every outbound entry point.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use common::TestApp;
use gudang_core::errors::ServiceError;
use gudang_core::models::TransactionType;
use gudang_core::services::{available_stock, ItemDraft, TransactionDraft};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn draft(tx_type: TransactionType, lines: &[(Uuid, i64)]) -> TransactionDraft {
    TransactionDraft {
        tx_type,
        date: Utc::now().date_naive(),
        partner_id: Uuid::new_v4(),
        reference_no: "INV-1".into(),
        notes: String::new(),
        items: lines
            .iter()
            .map(|(product_id, quantity)| ItemDraft {
                product_id: *product_id,
                quantity: *quantity,
                price_per_unit: dec!(1000),
            })
            .collect(),
    }
}

#[test]
fn add_then_delete_restores_every_affected_product() {
    let app = TestApp::new();
    let tx_service = &app.state.services.transactions;

    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 10);
    let bracket = app.seed_product("B1", "Bracket", 5, dec!(500), 4);

    let tx = tx_service
        .record(draft(
            TransactionType::Outbound,
            &[(widget.id, 3), (bracket.id, 2)],
        ))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 7);
    assert_eq!(app.stock_of(bracket.id), 2);

    tx_service.delete(tx.id).unwrap();
    assert_eq!(app.stock_of(widget.id), 10);
    assert_eq!(app.stock_of(bracket.id), 4);
}

#[test]
fn quantity_revision_lands_on_the_net_value() {
    // Product at 10, OUT of 3 leaves 7. Changing the quantity to 5 must
    // land on 5 (revert +3 then apply -5), not any other composition.
    let app = TestApp::new();
    let tx_service = &app.state.services.transactions;
    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 10);

    let tx = tx_service
        .record(draft(TransactionType::Outbound, &[(widget.id, 3)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 7);

    tx_service
        .update(tx.id, draft(TransactionType::Outbound, &[(widget.id, 5)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 5);
}

#[test]
fn edit_may_swap_the_item_set_entirely() {
    let app = TestApp::new();
    let tx_service = &app.state.services.transactions;
    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 10);
    let bracket = app.seed_product("B1", "Bracket", 5, dec!(500), 10);

    let tx = tx_service
        .record(draft(TransactionType::Inbound, &[(widget.id, 6)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 16);

    // The revision references a different product.
    tx_service
        .update(tx.id, draft(TransactionType::Inbound, &[(bracket.id, 2)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 10);
    assert_eq!(app.stock_of(bracket.id), 12);
}

#[test]
fn availability_credits_only_the_transaction_being_edited() {
    let app = TestApp::new();
    let tx_service = &app.state.services.transactions;
    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 10);

    let first = tx_service
        .record(draft(TransactionType::Outbound, &[(widget.id, 6)]))
        .unwrap();
    tx_service
        .record(draft(TransactionType::Outbound, &[(widget.id, 3)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 1);

    // Editing the first OUT: its own 6 units come back into the pool, the
    // other OUT's 3 do not. 1 + 6 = 7 available.
    assert_matches!(
        tx_service.update(first.id, draft(TransactionType::Outbound, &[(widget.id, 8)])),
        Err(ServiceError::InsufficientStock(_))
    );
    tx_service
        .update(first.id, draft(TransactionType::Outbound, &[(widget.id, 7)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 0);
}

#[test]
fn available_stock_is_one_pure_function() {
    let app = TestApp::new();
    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 10);
    let staged = [
        ItemDraft {
            product_id: widget.id,
            quantity: 4,
            price_per_unit: dec!(1000),
        },
        ItemDraft {
            product_id: widget.id,
            quantity: 2,
            price_per_unit: dec!(1000),
        },
    ];
    // No original transaction: plain current minus staged.
    assert_eq!(available_stock(&widget, &staged, None), 4);
    assert_eq!(available_stock(&widget, &[], None), 10);
}

#[test]
fn ledger_invariant_over_a_mixed_sequence() {
    // current_stock must always equal the signed sum of stored transaction
    // quantities, regardless of the add/update/delete order.
    let app = TestApp::new();
    let tx_service = &app.state.services.transactions;
    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 0);

    let a = tx_service
        .record(draft(TransactionType::Inbound, &[(widget.id, 20)]))
        .unwrap();
    let b = tx_service
        .record(draft(TransactionType::Outbound, &[(widget.id, 5)]))
        .unwrap();
    tx_service
        .record(draft(TransactionType::Inbound, &[(widget.id, 7)]))
        .unwrap();
    tx_service
        .update(b.id, draft(TransactionType::Outbound, &[(widget.id, 9)]))
        .unwrap();
    tx_service.delete(a.id).unwrap();

    let expected: i64 = tx_service
        .list()
        .iter()
        .map(|tx| {
            let qty = tx.quantity_of(widget.id);
            match tx.tx_type {
                TransactionType::Inbound => qty,
                TransactionType::Outbound => -qty,
            }
        })
        .sum();
    assert_eq!(app.stock_of(widget.id), expected);
    assert_eq!(app.stock_of(widget.id), 7 - 9);
}

#[test]
fn opname_resets_the_baseline_for_subsequent_deltas() {
    let app = TestApp::new();
    let services = &app.state.services;
    let widget = app.seed_product("W1", "Widget", 5, dec!(1000), 0);

    services
        .transactions
        .record(draft(TransactionType::Inbound, &[(widget.id, 10)]))
        .unwrap();

    // Physical count finds 6, not 10.
    let mut sheet = services.opname.start_sheet("audit");
    sheet.record_count(widget.id, 6);
    services.opname.complete(sheet).unwrap();
    assert_eq!(app.stock_of(widget.id), 6);

    // Later deltas build on the reconciled baseline.
    services
        .transactions
        .record(draft(TransactionType::Outbound, &[(widget.id, 2)]))
        .unwrap();
    assert_eq!(app.stock_of(widget.id), 4);
}
