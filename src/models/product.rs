use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry. `current_stock` is a running materialized view of every
/// applied transaction and opname overwrite that touched this product; it is
/// never recomputed from history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: String,
    /// Unit of measurement, e.g. Pcs, Kg, Box.
    pub unit: String,
    pub min_stock: i64,
    pub price: Decimal,
    pub current_stock: i64,
    /// Weak reference to a storage location; dangling ids are a display gap,
    /// not an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
}

impl Product {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        unit: impl Into<String>,
        min_stock: i64,
        price: Decimal,
        location_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            name: name.into(),
            category: category.into(),
            unit: unit.into(),
            min_stock,
            price,
            current_stock: 0,
            location_id,
        }
    }

    /// A product at or below its minimum is a restock candidate.
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }

    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.current_stock)
    }
}
