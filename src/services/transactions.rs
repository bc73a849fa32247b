use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ServiceError, StockShortage};
use crate::events::{Event, EventSender};
use crate::models::transaction::total_of;
use crate::models::{Product, Transaction, TransactionItem, TransactionType};
use crate::store::{AppData, Collection, StateStore};

/// One line of a transaction being entered. The product snapshot
/// (name/code/unit) is resolved from the catalog when the draft is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemDraft {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    pub price_per_unit: Decimal,
}

/// A stock movement being entered or revised.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransactionDraft {
    pub tx_type: TransactionType,
    pub date: NaiveDate,
    pub partner_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "Reference number is required"))]
    pub reference_no: String,
    #[serde(default)]
    pub notes: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<ItemDraft>,
}

/// Stock still available to an outbound line of `product` given the lines
/// already staged in the entry form and, when revising, the stored original
/// transaction.
///
/// The original outbound transaction's own quantities are credited back so a
/// revision does not double-count the stock it already holds. This is the
/// one availability definition; every outbound entry point must use it.
pub fn available_stock(
    product: &Product,
    staged: &[ItemDraft],
    original: Option<&Transaction>,
) -> i64 {
    let mut base = product.current_stock;

    if let Some(original) = original.filter(|tx| tx.tx_type == TransactionType::Outbound) {
        base += original.quantity_of(product.id);
    }

    let staged_qty: i64 = staged
        .iter()
        .filter(|item| item.product_id == product.id)
        .map(|item| item.quantity)
        .sum();

    base - staged_qty
}

/// Mutates product stock by the transaction's full item list. An item whose
/// product is no longer in the catalog is skipped; history referencing a
/// deleted product stays inert rather than failing.
pub(crate) fn apply_stock(state: &mut AppData, tx: &Transaction) {
    shift_stock(state, tx, false);
}

/// The exact inverse of [`apply_stock`]. Reversal replays inverse deltas; it
/// never recomputes from history, because items carry point-in-time
/// snapshots the catalog may no longer match.
pub(crate) fn reverse_stock(state: &mut AppData, tx: &Transaction) {
    shift_stock(state, tx, true);
}

fn shift_stock(state: &mut AppData, tx: &Transaction, invert: bool) {
    for item in &tx.items {
        let mut delta = match tx.tx_type {
            TransactionType::Inbound => item.quantity,
            TransactionType::Outbound => -item.quantity,
        };
        if invert {
            delta = -delta;
        }
        match state.product_mut(item.product_id) {
            Some(product) => product.current_stock += delta,
            None => warn!(
                product_id = %item.product_id,
                transaction_id = %tx.id,
                "stock shift skipped: product not in catalog"
            ),
        }
    }
}

/// Applies the transaction and prepends it to the log (canonical order is
/// most-recent-first).
pub(crate) fn push_transaction(state: &mut AppData, tx: Transaction) {
    apply_stock(state, &tx);
    state.transactions.insert(0, tx);
}

/// Service for recording, revising, and deleting stock movements while
/// keeping every product's `current_stock` consistent.
#[derive(Clone)]
pub struct TransactionService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl TransactionService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Records a new movement and applies its stock effect.
    #[instrument(skip(self, draft), fields(tx_type = %draft.tx_type, lines = draft.items.len()))]
    pub fn record(&self, draft: TransactionDraft) -> Result<Transaction, ServiceError> {
        draft.validate()?;

        let tx = self.store.mutate(
            &[Collection::Transactions, Collection::Products],
            |state| {
                let tx = build_transaction(state, &draft, None)?;
                let snapshot = tx.clone();
                push_transaction(state, tx);
                Ok(snapshot)
            },
        )?;

        info!(transaction_id = %tx.id, reference_no = %tx.reference_no, "transaction recorded");
        self.event_sender.send(Event::TransactionRecorded {
            transaction_id: tx.id,
            tx_type: tx.tx_type,
            line_count: tx.items.len(),
        });
        Ok(tx)
    }

    /// Replaces a stored movement with a revision.
    ///
    /// Always the two-step revert-then-apply sequence, never a diff: item
    /// sets, quantities, and even the direction may all differ between the
    /// stored version and the revision.
    #[instrument(skip(self, draft))]
    pub fn update(&self, id: Uuid, draft: TransactionDraft) -> Result<Transaction, ServiceError> {
        draft.validate()?;

        let tx = self.store.mutate(
            &[Collection::Transactions, Collection::Products],
            |state| {
                let pos = state
                    .transactions
                    .iter()
                    .position(|t| t.id == id)
                    .ok_or_else(|| ServiceError::NotFound(format!("transaction {id}")))?;
                let original = state.transactions[pos].clone();
                let replacement = build_transaction(state, &draft, Some(&original))?;

                reverse_stock(state, &original);
                apply_stock(state, &replacement);
                state.transactions[pos] = replacement.clone();
                Ok(replacement)
            },
        )?;

        info!(transaction_id = %tx.id, "transaction revised");
        self.event_sender.send(Event::TransactionUpdated(tx.id));
        Ok(tx)
    }

    /// Reverses and removes a stored movement. Unknown ids are a silent
    /// no-op, reported as `Ok(false)`.
    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.store.mutate(
            &[Collection::Transactions, Collection::Products],
            |state| {
                let Some(pos) = state.transactions.iter().position(|t| t.id == id) else {
                    return Ok(false);
                };
                let tx = state.transactions.remove(pos);
                reverse_stock(state, &tx);
                Ok(true)
            },
        )?;

        if removed {
            info!(transaction_id = %id, "transaction deleted");
            self.event_sender.send(Event::TransactionDeleted(id));
        }
        Ok(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<Transaction> {
        self.store
            .read(|state| state.transactions.iter().find(|t| t.id == id).cloned())
    }

    /// Most-recent-first, the canonical list order.
    pub fn list(&self) -> Vec<Transaction> {
        self.store.read(|state| state.transactions.clone())
    }

    pub fn list_by_type(&self, tx_type: TransactionType) -> Vec<Transaction> {
        self.store.read(|state| {
            state
                .transactions
                .iter()
                .filter(|t| t.tx_type == tx_type)
                .cloned()
                .collect()
        })
    }

    /// Availability as seen from an entry form, for callers that surface the
    /// remaining quantity while lines are being staged.
    pub fn available_for(
        &self,
        product_id: Uuid,
        staged: &[ItemDraft],
        original_tx: Option<Uuid>,
    ) -> Option<i64> {
        self.store.read(|state| {
            let product = state.product(product_id)?;
            let original = original_tx.and_then(|id| state.transactions.iter().find(|t| t.id == id));
            Some(available_stock(product, staged, original))
        })
    }
}

/// Resolves a draft against the catalog: snapshots product identity into the
/// items, recomputes the denormalized total, and enforces outbound
/// availability. Unknown products are rejected here — leniency is reserved
/// for applying already-recorded history.
fn build_transaction(
    state: &AppData,
    draft: &TransactionDraft,
    original: Option<&Transaction>,
) -> Result<Transaction, ServiceError> {
    let mut items = Vec::with_capacity(draft.items.len());
    for line in &draft.items {
        line.validate()?;
        if line.price_per_unit < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price per unit must not be negative".into(),
            ));
        }
        let product = state.product(line.product_id).ok_or_else(|| {
            ServiceError::NotFound(format!("product {} not in catalog", line.product_id))
        })?;
        items.push(TransactionItem {
            product_id: product.id,
            product_name: product.name.clone(),
            product_code: product.code.clone(),
            unit: product.unit.clone(),
            quantity: line.quantity,
            price_per_unit: line.price_per_unit,
        });
    }

    if draft.tx_type == TransactionType::Outbound {
        let shortages = outbound_shortages(state, &draft.items, original);
        if !shortages.is_empty() {
            return Err(ServiceError::InsufficientStock(shortages));
        }
    }

    let (id, created_at) = match original {
        Some(original) => (original.id, original.created_at),
        None => (Uuid::new_v4(), Utc::now()),
    };

    Ok(Transaction {
        id,
        tx_type: draft.tx_type,
        date: draft.date,
        partner_id: draft.partner_id,
        reference_no: draft.reference_no.clone(),
        notes: draft.notes.clone(),
        total_value: total_of(&items),
        items,
        created_at,
    })
}

fn outbound_shortages(
    state: &AppData,
    staged: &[ItemDraft],
    original: Option<&Transaction>,
) -> Vec<StockShortage> {
    let mut seen: Vec<Uuid> = Vec::new();
    let mut shortages = Vec::new();
    for line in staged {
        if seen.contains(&line.product_id) {
            continue;
        }
        seen.push(line.product_id);
        let Some(product) = state.product(line.product_id) else {
            continue;
        };
        let remaining = available_stock(product, staged, original);
        if remaining < 0 {
            let requested: i64 = staged
                .iter()
                .filter(|l| l.product_id == line.product_id)
                .map(|l| l.quantity)
                .sum();
            shortages.push(StockShortage {
                product_id: product.id,
                product_name: product.name.clone(),
                requested,
                available: requested + remaining,
            });
        }
    }
    shortages
}
