use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
pub enum OrderType {
    #[serde(rename = "PO")]
    #[strum(serialize = "PO")]
    Purchase,
    #[serde(rename = "SO")]
    #[strum(serialize = "SO")]
    Sales,
}

/// Order lifecycle states.
///
/// `Draft → Open → Completed`, with `Cancelled` reachable from any
/// non-terminal state. `PartiallyFulfilled` is reserved for partial-quantity
/// fulfillment: no transition produces it, but fulfillment and cancellation
/// accept it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Draft,
    Open,
    PartiallyFulfilled,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Confirmation locks item and price data by convention.
    pub fn can_confirm(self) -> bool {
        self == OrderStatus::Draft
    }

    pub fn can_fulfill(self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::PartiallyFulfilled)
    }

    /// Cancelled orders are defined as never having been fulfilled, so the
    /// transition carries no stock effect.
    pub fn can_cancel(self) -> bool {
        !self.is_terminal()
    }
}

/// A purchase or sales order. Fulfillment produces exactly one transaction
/// and links it through `related_transaction_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub partner_id: Uuid,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,
    pub status: OrderStatus,
    pub items: Vec<TransactionItem>,
    pub total_value: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<Uuid>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}
