use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a stock movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
pub enum TransactionType {
    #[serde(rename = "IN")]
    #[strum(serialize = "IN")]
    Inbound,
    #[serde(rename = "OUT")]
    #[strum(serialize = "OUT")]
    Outbound,
}

/// One line of a transaction or order. Embedded value type, not an entity:
/// product name, code, and unit are point-in-time snapshots so history stays
/// readable after the catalog entry changes or disappears.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub unit: String,
    pub quantity: i64,
    pub price_per_unit: Decimal,
}

impl TransactionItem {
    pub fn subtotal(&self) -> Decimal {
        self.price_per_unit * Decimal::from(self.quantity)
    }
}

/// Sum of line subtotals; the denormalized `total_value` on transactions and
/// orders must always equal this.
pub fn total_of(items: &[TransactionItem]) -> Decimal {
    items.iter().map(TransactionItem::subtotal).sum()
}

/// A recorded stock movement. Creation, edit, and deletion each mutate the
/// product stock levels through the transaction engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub date: NaiveDate,
    pub partner_id: Uuid,
    /// Invoice or order number this movement realizes.
    pub reference_no: String,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<TransactionItem>,
    pub total_value: Decimal,
    /// Activity-feed ordering key, distinct from the document date.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Total quantity of one product across all lines. Lines may repeat a
    /// product; callers must never assume at most one line per product.
    pub fn quantity_of(&self, product_id: Uuid) -> i64 {
        self.items
            .iter()
            .filter(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .sum()
    }

    pub fn references_product(&self, product_id: Uuid) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }
}
