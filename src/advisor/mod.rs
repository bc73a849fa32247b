use std::fmt::Write as _;

use crate::models::TransactionType;
use crate::services::reports::AdvisorySummary;

/// Narrative advisory collaborator. Implementations turn a ledger summary
/// into free-text advisory copy for the dashboard.
///
/// The contract is total: an engine that cannot produce a narrative (missing
/// credential, transport failure) must return [`fallback_advisory`] instead
/// of failing, so the caller never has to handle an error path.
pub trait Advisor {
    fn advise(&self, summary: &AdvisorySummary) -> String;
}

/// The built-in engine: a deterministic narrative rendered from the summary
/// alone. Also the degraded output every other engine falls back to.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAdvisor;

impl Advisor for OfflineAdvisor {
    fn advise(&self, summary: &AdvisorySummary) -> String {
        fallback_advisory(summary)
    }
}

/// Fixed informational text built from the advisory summary.
pub fn fallback_advisory(summary: &AdvisorySummary) -> String {
    let mut text = String::new();

    let _ = writeln!(
        text,
        "Ringkasan gudang: {} produk, total nilai aset {} {}.",
        summary.total_products, summary.currency, summary.total_stock_value
    );

    if summary.low_stock.is_empty() {
        text.push_str("Semua stok berada di atas batas minimum.\n");
    } else {
        let _ = writeln!(
            text,
            "Prioritas restock ({} produk di bawah batas minimum):",
            summary.low_stock.len()
        );
        for row in &summary.low_stock {
            let _ = writeln!(
                text,
                "- {} (sisa {}, minimum {}): sarankan order {} unit.",
                row.product_name, row.current_stock, row.min_stock, row.suggested_order_qty
            );
        }
    }

    let inbound = summary
        .recent
        .iter()
        .filter(|t| t.tx_type == TransactionType::Inbound)
        .count();
    let outbound = summary.recent.len() - inbound;
    if !summary.recent.is_empty() {
        let trend = if inbound > outbound {
            "lebih banyak barang masuk daripada keluar"
        } else if outbound > inbound {
            "lebih banyak barang keluar daripada masuk"
        } else {
            "arus masuk dan keluar seimbang"
        };
        let _ = writeln!(
            text,
            "Tren {} transaksi terakhir: {}.",
            summary.recent.len(),
            trend
        );
    }

    text
}
