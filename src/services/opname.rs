use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{OpnameItem, OpnameStatus, StockOpname};
use crate::store::{Collection, StateStore};

/// Stock-take service. Completion writes the physical count back into the
/// catalog as an absolute value; it never goes through the transaction
/// engine, so it resets the baseline for subsequent deltas.
#[derive(Clone)]
pub struct OpnameService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl OpnameService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Snapshots the whole catalog into a fresh counting sheet. Every item
    /// starts with `physical_qty == system_qty`.
    pub fn start_sheet(&self, notes: impl Into<String>) -> StockOpname {
        self.store.read(|state| StockOpname {
            id: Uuid::new_v4(),
            date: Utc::now().date_naive(),
            notes: notes.into(),
            items: state
                .products
                .iter()
                .map(|product| OpnameItem {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    system_qty: product.current_stock,
                    physical_qty: product.current_stock,
                    difference: 0,
                })
                .collect(),
            status: OpnameStatus::Draft,
        })
    }

    /// Stores a sheet for later completion. No stock effect.
    #[instrument(skip(self, sheet), fields(opname_id = %sheet.id))]
    pub fn save_draft(&self, mut sheet: StockOpname) -> Result<StockOpname, ServiceError> {
        sheet.status = OpnameStatus::Draft;
        let stored = self.store.mutate(&[Collection::Opnames], |state| {
            state.opnames.insert(0, sheet.clone());
            Ok(sheet)
        })?;
        self.event_sender.send(Event::OpnameDrafted(stored.id));
        Ok(stored)
    }

    /// Completes a stock-take: items with no discrepancy are dropped from
    /// the persisted record, and each retained item's physical count is
    /// written into the product as its new `current_stock` — an absolute
    /// overwrite, not a delta.
    #[instrument(skip(self, sheet), fields(opname_id = %sheet.id))]
    pub fn complete(&self, mut sheet: StockOpname) -> Result<StockOpname, ServiceError> {
        sheet.status = OpnameStatus::Completed;
        sheet.items.retain(OpnameItem::has_discrepancy);

        let stored = self.store.mutate(
            &[Collection::Opnames, Collection::Products],
            |state| {
                for item in &sheet.items {
                    match state.product_mut(item.product_id) {
                        Some(product) => product.current_stock = item.physical_qty,
                        None => warn!(
                            product_id = %item.product_id,
                            "opname write-back skipped: product not in catalog"
                        ),
                    }
                }
                state.opnames.insert(0, sheet.clone());
                Ok(sheet)
            },
        )?;

        info!(
            opname_id = %stored.id,
            adjusted_products = stored.items.len(),
            "stock opname completed"
        );
        self.event_sender.send(Event::OpnameCompleted {
            opname_id: stored.id,
            adjusted_products: stored.items.len(),
        });
        Ok(stored)
    }

    pub fn list(&self) -> Vec<StockOpname> {
        self.store.read(|state| state.opnames.clone())
    }

    pub fn get(&self, id: Uuid) -> Option<StockOpname> {
        self.store
            .read(|state| state.opnames.iter().find(|o| o.id == id).cloned())
    }
}
