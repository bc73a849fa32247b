use chrono::{NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ServiceError, StockShortage};
use crate::events::{Event, EventSender};
use crate::models::transaction::total_of;
use crate::models::{
    Order, OrderStatus, OrderType, Transaction, TransactionItem, TransactionType,
};
use crate::services::transactions::{push_transaction, ItemDraft};
use crate::store::{AppData, Collection, StateStore};

/// An order being entered. Item snapshots are resolved from the catalog the
/// same way transaction drafts are.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderDraft {
    pub order_type: OrderType,
    pub partner_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub expected_date: Option<NaiveDate>,
    /// Generated (`PO-1234` style) when not supplied.
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<ItemDraft>,
}

/// Service owning the order book and its status lifecycle. Fulfillment is
/// the only transition with a stock side effect.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Creates an order in `Draft`. No stock effect; sales orders may be
    /// drafted beyond current stock and become backorders.
    #[instrument(skip(self, draft), fields(order_type = %draft.order_type, lines = draft.items.len()))]
    pub fn create(&self, draft: OrderDraft) -> Result<Order, ServiceError> {
        draft.validate()?;

        let order = self.store.mutate(&[Collection::Orders], |state| {
            let items = resolve_items(state, &draft.items)?;
            let order = Order {
                id: Uuid::new_v4(),
                order_number: draft
                    .order_number
                    .clone()
                    .unwrap_or_else(|| generate_order_number(draft.order_type)),
                order_type: draft.order_type,
                partner_id: draft.partner_id,
                date: draft.date,
                expected_date: draft.expected_date,
                status: OrderStatus::Draft,
                total_value: total_of(&items),
                items,
                notes: draft.notes.clone(),
                related_transaction_id: None,
                created_at: Utc::now(),
            };
            state.orders.insert(0, order.clone());
            Ok(order)
        })?;

        info!(order_id = %order.id, order_number = %order.order_number, "order drafted");
        self.event_sender.send(Event::OrderCreated(order.id));
        Ok(order)
    }

    /// Replaces a stored order wholesale, recomputing the denormalized
    /// total. Item and price data are locked after confirmation by
    /// convention only; this operation does not police it.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn update(&self, mut order: Order) -> Result<Order, ServiceError> {
        order.total_value = total_of(&order.items);

        let order = self.store.mutate(&[Collection::Orders], |state| {
            let stored = state
                .orders
                .iter_mut()
                .find(|o| o.id == order.id)
                .ok_or_else(|| ServiceError::NotFound(format!("order {}", order.id)))?;
            *stored = order.clone();
            Ok(order)
        })?;

        self.event_sender.send(Event::OrderUpdated(order.id));
        Ok(order)
    }

    /// Draft → Open. Pure status transition, no stock effect.
    #[instrument(skip(self))]
    pub fn confirm(&self, id: Uuid) -> Result<Order, ServiceError> {
        self.transition(id, OrderStatus::Open, |status| status.can_confirm())
    }

    /// Any non-terminal state → Cancelled. Explicitly no stock effect:
    /// cancelled orders are defined as never having been fulfilled.
    #[instrument(skip(self))]
    pub fn cancel(&self, id: Uuid) -> Result<Order, ServiceError> {
        self.transition(id, OrderStatus::Cancelled, |status| status.can_cancel())
    }

    /// Open|PartiallyFulfilled → Completed, realizing the order as a stock
    /// movement.
    ///
    /// For sales orders every line is checked against current stock first;
    /// any shortage aborts the whole fulfillment before anything mutates.
    /// The synthesized transaction, the stock effect, and the status change
    /// then land as one unit.
    #[instrument(skip(self))]
    pub fn fulfill(&self, id: Uuid) -> Result<(Order, Transaction), ServiceError> {
        let (order, tx) = self.store.mutate(
            &[
                Collection::Orders,
                Collection::Transactions,
                Collection::Products,
            ],
            |state| {
                let pos = state
                    .orders
                    .iter()
                    .position(|o| o.id == id)
                    .ok_or_else(|| ServiceError::NotFound(format!("order {id}")))?;
                let order = state.orders[pos].clone();

                if !order.status.can_fulfill() {
                    return Err(ServiceError::InvalidStatus(format!(
                        "order {} is {} and cannot be fulfilled",
                        order.order_number, order.status
                    )));
                }

                if order.order_type == OrderType::Sales {
                    let shortages = sales_shortages(state, &order);
                    if !shortages.is_empty() {
                        return Err(ServiceError::InsufficientStock(shortages));
                    }
                }

                let tx = Transaction {
                    id: Uuid::new_v4(),
                    tx_type: match order.order_type {
                        OrderType::Purchase => TransactionType::Inbound,
                        OrderType::Sales => TransactionType::Outbound,
                    },
                    date: Utc::now().date_naive(),
                    partner_id: order.partner_id,
                    reference_no: order.order_number.clone(),
                    notes: format!(
                        "Auto-generated fulfillment of {} #{}",
                        order.order_type, order.order_number
                    ),
                    // Copied verbatim, cached prices and units included.
                    items: order.items.clone(),
                    total_value: order.total_value,
                    created_at: Utc::now(),
                };
                push_transaction(state, tx.clone());

                let stored = &mut state.orders[pos];
                stored.status = OrderStatus::Completed;
                stored.related_transaction_id = Some(tx.id);
                Ok((stored.clone(), tx))
            },
        )?;

        info!(
            order_id = %order.id,
            transaction_id = %tx.id,
            order_number = %order.order_number,
            "order fulfilled"
        );
        self.event_sender.send(Event::TransactionRecorded {
            transaction_id: tx.id,
            tx_type: tx.tx_type,
            line_count: tx.items.len(),
        });
        self.event_sender.send(Event::OrderFulfilled {
            order_id: order.id,
            order_type: order.order_type,
            transaction_id: tx.id,
        });
        Ok((order, tx))
    }

    /// Removes an order from the book. Unknown ids are a silent no-op.
    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.store.mutate(&[Collection::Orders], |state| {
            let before = state.orders.len();
            state.orders.retain(|o| o.id != id);
            Ok(state.orders.len() != before)
        })?;
        if removed {
            self.event_sender.send(Event::OrderDeleted(id));
        }
        Ok(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<Order> {
        self.store
            .read(|state| state.orders.iter().find(|o| o.id == id).cloned())
    }

    pub fn list(&self) -> Vec<Order> {
        self.store.read(|state| state.orders.clone())
    }

    pub fn list_by_type(&self, order_type: OrderType) -> Vec<Order> {
        self.store.read(|state| {
            state
                .orders
                .iter()
                .filter(|o| o.order_type == order_type)
                .cloned()
                .collect()
        })
    }

    fn transition(
        &self,
        id: Uuid,
        to: OrderStatus,
        permitted: impl Fn(OrderStatus) -> bool,
    ) -> Result<Order, ServiceError> {
        let (order, old_status) = self.store.mutate(&[Collection::Orders], |state| {
            let stored = state
                .orders
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| ServiceError::NotFound(format!("order {id}")))?;
            if !permitted(stored.status) {
                return Err(ServiceError::InvalidStatus(format!(
                    "order {} cannot move from {} to {}",
                    stored.order_number, stored.status, to
                )));
            }
            let old_status = stored.status;
            stored.status = to;
            Ok((stored.clone(), old_status))
        })?;

        info!(order_id = %order.id, %old_status, new_status = %to, "order status changed");
        self.event_sender.send(Event::OrderStatusChanged {
            order_id: order.id,
            old_status,
            new_status: to,
        });
        Ok(order)
    }
}

/// Per-line stock check for sales fulfillment. Lines are checked
/// independently against current stock; a line whose product has left the
/// catalog counts as having nothing available.
fn sales_shortages(state: &AppData, order: &Order) -> Vec<StockShortage> {
    order
        .items
        .iter()
        .filter_map(|item| {
            let available = state
                .product(item.product_id)
                .map_or(0, |p| p.current_stock);
            (item.quantity > available).then(|| StockShortage {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                requested: item.quantity,
                available,
            })
        })
        .collect()
}

fn resolve_items(state: &AppData, lines: &[ItemDraft]) -> Result<Vec<TransactionItem>, ServiceError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
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
    Ok(items)
}

fn generate_order_number(order_type: OrderType) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10000);
    format!("{order_type}-{suffix}")
}
