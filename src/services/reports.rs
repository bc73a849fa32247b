use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Transaction, TransactionType};
use crate::services::restock::suggested_order_qty;
use crate::store::StateStore;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: usize,
    pub low_stock_count: usize,
    /// Σ current_stock × price over the whole catalog.
    pub total_stock_value: Decimal,
    pub inbound_count: usize,
    pub outbound_count: usize,
}

/// Per-product movement within a reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRow {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    pub qty_in: i64,
    pub qty_out: i64,
    pub value_in: Decimal,
    pub value_out: Decimal,
    pub ending_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockRow {
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub category: String,
    pub current_stock: i64,
    pub min_stock: i64,
    pub suggested_order_qty: i64,
}

/// Compact transaction digest handed to the advisory collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransactionDigest {
    pub tx_type: TransactionType,
    pub date: NaiveDate,
    pub reference_no: String,
    pub line_count: usize,
}

/// Data contract for the AI narrative collaborator: a summary, never the
/// raw collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorySummary {
    pub total_products: usize,
    pub total_stock_value: Decimal,
    pub currency: String,
    pub low_stock: Vec<LowStockRow>,
    pub recent: Vec<RecentTransactionDigest>,
}

/// Read-only aggregate queries over the ledger.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<StateStore>,
}

impl ReportService {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub fn dashboard_stats(&self) -> DashboardStats {
        self.store.read(|state| DashboardStats {
            total_products: state.products.len(),
            low_stock_count: state.products.iter().filter(|p| p.is_low_stock()).count(),
            total_stock_value: state.products.iter().map(|p| p.stock_value()).sum(),
            inbound_count: state
                .transactions
                .iter()
                .filter(|t| t.tx_type == TransactionType::Inbound)
                .count(),
            outbound_count: state
                .transactions
                .iter()
                .filter(|t| t.tx_type == TransactionType::Outbound)
                .count(),
        })
    }

    /// Movement per catalog product over an inclusive date window,
    /// optionally restricted to one direction. History lines whose product
    /// has left the catalog are not represented; the report is a catalog
    /// view, not a transaction dump.
    pub fn movement_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        direction: Option<TransactionType>,
    ) -> Vec<MovementRow> {
        self.store.read(|state| {
            let in_window = |tx: &&Transaction| {
                tx.date >= from && tx.date <= to && direction.map_or(true, |d| tx.tx_type == d)
            };

            state
                .products
                .iter()
                .map(|product| {
                    let mut row = MovementRow {
                        product_id: product.id,
                        product_code: product.code.clone(),
                        product_name: product.name.clone(),
                        category: product.category.clone(),
                        qty_in: 0,
                        qty_out: 0,
                        value_in: Decimal::ZERO,
                        value_out: Decimal::ZERO,
                        ending_stock: product.current_stock,
                    };
                    for tx in state.transactions.iter().filter(in_window) {
                        for item in tx.items.iter().filter(|i| i.product_id == product.id) {
                            match tx.tx_type {
                                TransactionType::Inbound => {
                                    row.qty_in += item.quantity;
                                    row.value_in += item.subtotal();
                                }
                                TransactionType::Outbound => {
                                    row.qty_out += item.quantity;
                                    row.value_out += item.subtotal();
                                }
                            }
                        }
                    }
                    row
                })
                .collect()
        })
    }

    pub fn low_stock_report(&self) -> Vec<LowStockRow> {
        self.store.read(|state| {
            state
                .products
                .iter()
                .filter(|p| p.is_low_stock())
                .map(|p| LowStockRow {
                    product_id: p.id,
                    product_code: p.code.clone(),
                    product_name: p.name.clone(),
                    category: p.category.clone(),
                    current_stock: p.current_stock,
                    min_stock: p.min_stock,
                    suggested_order_qty: suggested_order_qty(p.min_stock),
                })
                .collect()
        })
    }

    /// Latest activity by `created_at`, newest first.
    pub fn recent_activity(&self, limit: usize) -> Vec<Transaction> {
        self.store.read(|state| {
            let mut transactions = state.transactions.clone();
            transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            transactions.truncate(limit);
            transactions
        })
    }

    pub fn advisory_summary(&self, recent_limit: usize) -> AdvisorySummary {
        let stats = self.dashboard_stats();
        AdvisorySummary {
            total_products: stats.total_products,
            total_stock_value: stats.total_stock_value,
            currency: self.store.read(|state| state.settings.currency.clone()),
            low_stock: self.low_stock_report(),
            recent: self
                .recent_activity(recent_limit)
                .into_iter()
                .map(|tx| RecentTransactionDigest {
                    tx_type: tx.tx_type,
                    date: tx.date,
                    reference_no: tx.reference_no,
                    line_count: tx.items.len(),
                })
                .collect(),
        }
    }
}
