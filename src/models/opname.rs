use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OpnameStatus {
    Draft,
    Completed,
}

/// One counted product in a stock-take sheet. `difference` is informational;
/// the completion write-back uses `physical_qty` as an absolute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpnameItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub system_qty: i64,
    pub physical_qty: i64,
    pub difference: i64,
}

impl OpnameItem {
    pub fn has_discrepancy(&self) -> bool {
        self.physical_qty != self.system_qty
    }
}

/// A stock-take ("opname") sheet reconciling recorded quantities against a
/// physical count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOpname {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub items: Vec<OpnameItem>,
    pub status: OpnameStatus,
}

impl StockOpname {
    /// Records a physical count for one product and refreshes its
    /// difference. Unknown products are ignored; the sheet only ever covers
    /// the catalog snapshot it was started from.
    pub fn record_count(&mut self, product_id: Uuid, physical_qty: i64) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.physical_qty = physical_qty;
            item.difference = physical_qty - item.system_qty;
        }
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &OpnameItem> {
        self.items.iter().filter(|i| i.has_discrepancy())
    }
}
