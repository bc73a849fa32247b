use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Order, OrderType, PartnerType, TransactionType};
use crate::services::orders::{OrderDraft, OrderService};
use crate::services::transactions::ItemDraft;
use crate::store::StateStore;

pub const UNKNOWN_SUPPLIER_LABEL: &str = "Supplier Belum Ditentukan";

/// Safety-stock heuristic: order up to three times the minimum, never fewer
/// than ten units. Not derived from lead-time data.
pub(crate) fn suggested_order_qty(min_stock: i64) -> i64 {
    (min_stock * 3).max(10)
}

/// One restock candidate inside a supplier group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockLine {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub unit: String,
    pub current_stock: i64,
    pub min_stock: i64,
    /// Catalog price at planning time; purchase lines are priced from it.
    pub price: Decimal,
    pub order_qty: i64,
    pub selected: bool,
}

/// Low-stock products bucketed under their preferred supplier. `supplier_id
/// = None` is the sentinel "unknown supplier" group that must be assigned
/// before it can generate an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierGroup {
    pub supplier_id: Option<Uuid>,
    pub supplier_name: String,
    pub items: Vec<RestockLine>,
}

impl SupplierGroup {
    pub fn selected_items(&self) -> impl Iterator<Item = &RestockLine> {
        self.items.iter().filter(|line| line.selected)
    }
}

/// An editable restock proposal. The user may retarget groups, toggle
/// lines, and adjust quantities before committing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestockPlan {
    pub groups: Vec<SupplierGroup>,
}

impl RestockPlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Overrides a proposed quantity. Quantities below one are ignored, the
    /// same floor the entry form enforces.
    pub fn set_quantity(&mut self, product_id: Uuid, order_qty: i64) {
        if order_qty < 1 {
            return;
        }
        if let Some(line) = self.line_mut(product_id) {
            line.order_qty = order_qty;
        }
    }

    pub fn toggle_item(&mut self, product_id: Uuid) {
        if let Some(line) = self.line_mut(product_id) {
            line.selected = !line.selected;
        }
    }

    /// Moves a whole group under a concrete supplier, merging with an
    /// existing group for that supplier when there is one.
    pub fn reassign(&mut self, from: Option<Uuid>, to_id: Uuid, to_name: &str) {
        let Some(pos) = self.groups.iter().position(|g| g.supplier_id == from) else {
            return;
        };
        let moved = self.groups.remove(pos);

        match self
            .groups
            .iter_mut()
            .find(|g| g.supplier_id == Some(to_id))
        {
            Some(existing) => existing.items.extend(moved.items),
            None => self.groups.insert(
                pos,
                SupplierGroup {
                    supplier_id: Some(to_id),
                    supplier_name: to_name.to_string(),
                    items: moved.items,
                },
            ),
        }
    }

    fn line_mut(&mut self, product_id: Uuid) -> Option<&mut RestockLine> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.items.iter_mut())
            .find(|line| line.product_id == product_id)
    }
}

/// What a commit produced: the drafted purchase orders plus the number of
/// groups skipped because no supplier was assigned. The caller surfaces the
/// skip count so those groups get a manual assignment.
#[derive(Debug)]
pub struct RestockOutcome {
    pub orders: Vec<Order>,
    pub skipped_groups: usize,
}

/// Planning query over the catalog and transaction history that drafts
/// purchase orders for everything at or below its minimum stock.
#[derive(Clone)]
pub struct RestockService {
    store: Arc<StateStore>,
    orders: OrderService,
}

impl RestockService {
    pub fn new(store: Arc<StateStore>, orders: OrderService) -> Self {
        Self { store, orders }
    }

    /// Builds the proposal: low-stock products grouped by preferred
    /// supplier, where "preferred" is the partner on the most recent inbound
    /// transaction containing the product.
    #[instrument(skip(self))]
    pub fn plan(&self) -> RestockPlan {
        self.store.read(|state| {
            let mut plan = RestockPlan::default();

            for product in state.products.iter().filter(|p| p.is_low_stock()) {
                // The log is most-recent-first, so the first hit is the
                // latest delivery.
                let supplier_id = state
                    .transactions
                    .iter()
                    .find(|tx| {
                        tx.tx_type == TransactionType::Inbound
                            && tx.references_product(product.id)
                    })
                    .map(|tx| tx.partner_id);

                let (group_key, group_name) = match supplier_id {
                    Some(id) => (
                        Some(id),
                        state
                            .partner(id)
                            .map(|p| p.name.clone())
                            .unwrap_or_else(|| "Unknown Supplier".to_string()),
                    ),
                    None => (None, UNKNOWN_SUPPLIER_LABEL.to_string()),
                };

                let line = RestockLine {
                    product_id: product.id,
                    product_code: product.code.clone(),
                    product_name: product.name.clone(),
                    unit: product.unit.clone(),
                    current_stock: product.current_stock,
                    min_stock: product.min_stock,
                    price: product.price,
                    order_qty: suggested_order_qty(product.min_stock),
                    selected: true,
                };

                match plan.groups.iter_mut().find(|g| g.supplier_id == group_key) {
                    Some(group) => group.items.push(line),
                    None => plan.groups.push(SupplierGroup {
                        supplier_id: group_key,
                        supplier_name: group_name,
                        items: vec![line],
                    }),
                }
            }

            plan
        })
    }

    /// Retargets a plan group onto one of the known suppliers.
    pub fn assign_supplier(
        &self,
        plan: &mut RestockPlan,
        from: Option<Uuid>,
        supplier_id: Uuid,
    ) -> Result<(), ServiceError> {
        let supplier = self
            .store
            .read(|state| state.partner(supplier_id).cloned())
            .ok_or_else(|| ServiceError::NotFound(format!("partner {supplier_id}")))?;
        if supplier.partner_type != PartnerType::Supplier {
            return Err(ServiceError::ValidationError(format!(
                "{} is not a supplier",
                supplier.name
            )));
        }
        plan.reassign(from, supplier.id, &supplier.name);
        Ok(())
    }

    /// Drafts one purchase order per resolved group with at least one
    /// selected line. Unresolved groups are skipped and counted.
    #[instrument(skip(self, plan), fields(groups = plan.groups.len()))]
    pub fn commit(&self, plan: &RestockPlan) -> Result<RestockOutcome, ServiceError> {
        let mut orders = Vec::new();
        let mut skipped_groups = 0;

        for group in &plan.groups {
            let selected: Vec<&RestockLine> = group.selected_items().collect();
            if selected.is_empty() {
                continue;
            }

            let Some(supplier_id) = group.supplier_id else {
                warn!(
                    items = selected.len(),
                    "restock group skipped: no supplier assigned"
                );
                skipped_groups += 1;
                continue;
            };

            let draft = OrderDraft {
                order_type: OrderType::Purchase,
                partner_id: supplier_id,
                date: Utc::now().date_naive(),
                expected_date: None,
                order_number: Some(format!(
                    "PO-AUTO-{}",
                    rand::thread_rng().gen_range(0..10000)
                )),
                notes: "Generated via auto-restock based on low stock analysis.".to_string(),
                items: selected
                    .iter()
                    .map(|line| ItemDraft {
                        product_id: line.product_id,
                        quantity: line.order_qty,
                        price_per_unit: line.price,
                    })
                    .collect(),
            };
            orders.push(self.orders.create(draft)?);
        }

        info!(
            orders_created = orders.len(),
            skipped_groups, "restock plan committed"
        );
        Ok(RestockOutcome {
            orders,
            skipped_groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventSender;
    use crate::models::{OrderStatus, Partner, Product, Transaction, TransactionItem};
    use crate::store::Collection;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct Fixture {
        restock: RestockService,
        store: Arc<StateStore>,
        product_a: Uuid,
        product_b: Uuid,
        supplier: Uuid,
    }

    fn fixture() -> Fixture {
        let store = StateStore::in_memory();

        let mut a = Product::new("A1", "Anchor", "Parts", "Pcs", 5, dec!(2000), None);
        a.current_stock = 2;
        let mut b = Product::new("B1", "Bolt", "Parts", "Pcs", 10, dec!(300), None);
        b.current_stock = 1;
        let supplier = Partner::new("CV Sumber Baja", PartnerType::Supplier, "0811", "Bandung", "s@b.id");
        let (product_a, product_b, supplier_id) = (a.id, b.id, supplier.id);

        // Product A has a prior inbound delivery from the supplier; B has no
        // history at all.
        let delivery = Transaction {
            id: Uuid::new_v4(),
            tx_type: TransactionType::Inbound,
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            partner_id: supplier_id,
            reference_no: "INV-77".into(),
            notes: String::new(),
            items: vec![TransactionItem {
                product_id: product_a,
                product_name: "Anchor".into(),
                product_code: "A1".into(),
                unit: "Pcs".into(),
                quantity: 5,
                price_per_unit: dec!(2000),
            }],
            total_value: dec!(10000),
            created_at: Utc::now(),
        };

        store
            .mutate(
                &[
                    Collection::Products,
                    Collection::Partners,
                    Collection::Transactions,
                ],
                |state| {
                    state.products.push(a);
                    state.products.push(b);
                    state.partners.push(supplier);
                    state.transactions.push(delivery);
                    Ok(())
                },
            )
            .unwrap();

        Fixture {
            restock: RestockService::new(store.clone(), OrderService::new(store.clone(), EventSender::new())),
            store,
            product_a,
            product_b,
            supplier: supplier_id,
        }
    }

    #[test]
    fn plan_groups_by_latest_inbound_supplier() {
        let f = fixture();
        let plan = f.restock.plan();
        assert_eq!(plan.groups.len(), 2);

        let known = plan
            .groups
            .iter()
            .find(|g| g.supplier_id == Some(f.supplier))
            .expect("supplier group");
        assert_eq!(known.supplier_name, "CV Sumber Baja");
        assert_eq!(known.items.len(), 1);
        assert_eq!(known.items[0].product_id, f.product_a);
        assert_eq!(known.items[0].order_qty, 15); // max(5*3, 10)

        let unknown = plan
            .groups
            .iter()
            .find(|g| g.supplier_id.is_none())
            .expect("unknown group");
        assert_eq!(unknown.supplier_name, UNKNOWN_SUPPLIER_LABEL);
        assert_eq!(unknown.items[0].product_id, f.product_b);
        assert_eq!(unknown.items[0].order_qty, 30); // max(10*3, 10)
    }

    #[test]
    fn healthy_stock_is_not_proposed() {
        let f = fixture();
        f.store
            .mutate(&[Collection::Products], |state| {
                for product in state.products.iter_mut() {
                    product.current_stock = product.min_stock + 1;
                }
                Ok(())
            })
            .unwrap();
        assert!(f.restock.plan().is_empty());
    }

    #[test]
    fn commit_skips_unknown_groups_and_counts_them() {
        let f = fixture();
        let plan = f.restock.plan();
        let outcome = f.restock.commit(&plan).unwrap();

        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(outcome.skipped_groups, 1);

        let order = &outcome.orders[0];
        assert_eq!(order.order_type, OrderType::Purchase);
        assert_eq!(order.status, OrderStatus::Draft);
        assert_eq!(order.partner_id, f.supplier);
        assert!(order.order_number.starts_with("PO-AUTO-"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 15);
        // Priced from the catalog, not from history.
        assert_eq!(order.items[0].price_per_unit, dec!(2000));
    }

    #[test]
    fn assigning_a_supplier_merges_into_its_group() {
        let f = fixture();
        let mut plan = f.restock.plan();
        f.restock
            .assign_supplier(&mut plan, None, f.supplier)
            .unwrap();

        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].items.len(), 2);

        let outcome = f.restock.commit(&plan).unwrap();
        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(outcome.skipped_groups, 0);
        assert_eq!(outcome.orders[0].items.len(), 2);
    }

    #[test]
    fn deselected_lines_are_left_out() {
        let f = fixture();
        let mut plan = f.restock.plan();
        f.restock
            .assign_supplier(&mut plan, None, f.supplier)
            .unwrap();
        plan.toggle_item(f.product_a);
        plan.set_quantity(f.product_b, 40);

        let outcome = f.restock.commit(&plan).unwrap();
        assert_eq!(outcome.orders.len(), 1);
        let order = &outcome.orders[0];
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product_id, f.product_b);
        assert_eq!(order.items[0].quantity, 40);
    }

    #[test]
    fn fully_deselected_group_generates_nothing() {
        let f = fixture();
        let mut plan = f.restock.plan();
        plan.toggle_item(f.product_a);
        let outcome = f.restock.commit(&plan).unwrap();
        assert!(outcome.orders.is_empty());
        // The unknown group still has a selected item, so it is counted.
        assert_eq!(outcome.skipped_groups, 1);
    }

    #[test]
    fn customers_cannot_be_assigned_as_suppliers() {
        let f = fixture();
        let customer = Partner::new("Toko Jaya", PartnerType::Customer, "0812", "Jakarta", "t@j.id");
        let customer_id = customer.id;
        f.store
            .mutate(&[Collection::Partners], |state| {
                state.partners.push(customer);
                Ok(())
            })
            .unwrap();

        let mut plan = f.restock.plan();
        assert_matches::assert_matches!(
            f.restock.assign_supplier(&mut plan, None, customer_id),
            Err(ServiceError::ValidationError(_))
        );
    }
}
