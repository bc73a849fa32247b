//! Spreadsheet export collaborator.
//!
//! Converts in-memory collections to `.xlsx` workbooks with the fixed,
//! user-visible column sets of each report type. Headers are part of the
//! compatibility contract and stay in the application's document language.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;
use umya_spreadsheet::Worksheet;

use crate::errors::ServiceError;
use crate::models::{CompanySettings, Order, OrderType, Partner, Product, StorageLocation};
use crate::services::reports::{LowStockRow, MovementRow};

enum Cell {
    Text(String),
    Number(f64),
    Int(i64),
    Empty,
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<&Decimal> for Cell {
    fn from(value: &Decimal) -> Self {
        Cell::Number(value.to_f64().unwrap_or(0.0))
    }
}

fn column_letter(index: usize) -> String {
    // Report sheets never exceed a handful of columns.
    let mut index = index;
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters
}

fn write_row(sheet: &mut Worksheet, row: u32, cells: Vec<Cell>) {
    for (idx, cell) in cells.into_iter().enumerate() {
        let address = format!("{}{}", column_letter(idx), row);
        match cell {
            Cell::Text(text) => {
                sheet.get_cell_mut(address.as_str()).set_value(text);
            }
            Cell::Number(value) => {
                sheet.get_cell_mut(address.as_str()).set_value_number(value);
            }
            Cell::Int(value) => {
                sheet
                    .get_cell_mut(address.as_str())
                    .set_value_number(value as f64);
            }
            Cell::Empty => {}
        }
    }
}

fn write_book(
    path: &Path,
    sheet_name: &str,
    rows: Vec<Vec<Cell>>,
    widths: &[f64],
) -> Result<(), ServiceError> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_by_name_mut("Sheet1")
        .ok_or_else(|| ServiceError::ExportError("default worksheet missing".into()))?;
    sheet.set_name(sheet_name);

    let row_count = rows.len();
    for (idx, row) in rows.into_iter().enumerate() {
        write_row(sheet, idx as u32 + 1, row);
    }
    for (idx, width) in widths.iter().enumerate() {
        sheet
            .get_column_dimension_mut(&column_letter(idx))
            .set_width(*width);
    }

    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| ServiceError::ExportError(format!("{e:?}")))?;
    info!(path = %path.display(), rows = row_count, "workbook written");
    Ok(())
}

/// Product catalog sheet.
pub fn export_product_catalog(
    path: &Path,
    products: &[Product],
    locations: &[StorageLocation],
) -> Result<(), ServiceError> {
    let mut rows = vec![vec![
        "Kode Barang".into(),
        "Nama Produk".into(),
        "Kategori".into(),
        "Lokasi".into(),
        "Satuan".into(),
        "Harga".into(),
        "Stok".into(),
        "Min. Stok".into(),
    ]];
    for product in products {
        let location = product
            .location_id
            .and_then(|id| locations.iter().find(|l| l.id == id))
            .map(|l| l.name.clone())
            .unwrap_or_else(|| "-".to_string());
        rows.push(vec![
            product.code.clone().into(),
            product.name.clone().into(),
            product.category.clone().into(),
            location.into(),
            product.unit.clone().into(),
            (&product.price).into(),
            product.current_stock.into(),
            product.min_stock.into(),
        ]);
    }
    write_book(path, "Produk", rows, &[15.0, 30.0, 15.0, 20.0, 10.0, 15.0, 10.0, 10.0])
}

/// Order book sheet for one order type, the list-view export.
pub fn export_order_list(
    path: &Path,
    orders: &[Order],
    partners: &[Partner],
    products: &[Product],
) -> Result<(), ServiceError> {
    let mut rows = vec![vec![
        "Tanggal".into(),
        "No. Order".into(),
        "Tipe".into(),
        "Partner".into(),
        "Kategori".into(),
        "Jumlah Item".into(),
        "Total Nilai".into(),
        "Status".into(),
        "Catatan".into(),
    ]];
    for order in orders {
        let partner = partners
            .iter()
            .find(|p| p.id == order.partner_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        // Distinct categories across the order's lines, catalog-resolved.
        let categories: BTreeSet<String> = order
            .items
            .iter()
            .filter_map(|item| products.iter().find(|p| p.id == item.product_id))
            .map(|p| p.category.clone())
            .filter(|c| !c.is_empty())
            .collect();
        let type_label = match order.order_type {
            OrderType::Purchase => "Purchase Order",
            OrderType::Sales => "Sales Order",
        };
        rows.push(vec![
            order.date.to_string().into(),
            order.order_number.clone().into(),
            type_label.into(),
            partner.into(),
            categories.into_iter().collect::<Vec<_>>().join(", ").into(),
            (order.items.len() as i64).into(),
            (&order.total_value).into(),
            order.status.to_string().into(),
            order.notes.clone().into(),
        ]);
    }
    write_book(
        path,
        "Data Order",
        rows,
        &[12.0, 18.0, 16.0, 25.0, 20.0, 12.0, 16.0, 14.0, 30.0],
    )
}

/// Printable order document: header info block, line table, total row.
pub fn export_order_detail(
    path: &Path,
    order: &Order,
    partner: Option<&Partner>,
    settings: &CompanySettings,
) -> Result<(), ServiceError> {
    let mut rows: Vec<Vec<Cell>> = vec![
        vec!["DETAIL ORDER".into()],
        vec!["Perusahaan".into(), settings.name.clone().into()],
        vec!["No. Order".into(), order.order_number.clone().into()],
        vec!["Tanggal".into(), order.date.to_string().into()],
        vec!["Status".into(), order.status.to_string().into()],
        vec![
            "Partner".into(),
            partner.map_or_else(|| "Unknown".to_string(), |p| p.name.clone()).into(),
        ],
        vec![
            "Alamat".into(),
            partner.map_or_else(|| "-".to_string(), |p| p.address.clone()).into(),
        ],
        vec![
            "Kontak".into(),
            partner.map_or_else(|| "-".to_string(), |p| p.contact.clone()).into(),
        ],
        vec![],
        vec![
            "Kode Barang".into(),
            "Nama Barang".into(),
            "Qty".into(),
            "Unit".into(),
            "Harga Satuan".into(),
            "Total Harga".into(),
        ],
    ];
    for item in &order.items {
        rows.push(vec![
            item.product_code.clone().into(),
            item.product_name.clone().into(),
            item.quantity.into(),
            item.unit.clone().into(),
            (&item.price_per_unit).into(),
            (&item.subtotal()).into(),
        ]);
    }
    rows.push(vec![
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        Cell::Empty,
        "TOTAL".into(),
        (&order.total_value).into(),
    ]);

    write_book(
        path,
        "Detail Order",
        rows,
        &[15.0, 30.0, 10.0, 10.0, 15.0, 15.0],
    )
}

/// Restock shortlist.
pub fn export_low_stock(path: &Path, rows: &[LowStockRow]) -> Result<(), ServiceError> {
    let mut sheet_rows = vec![vec![
        "Kode Barang".into(),
        "Nama Produk".into(),
        "Kategori".into(),
        "Sisa Stok".into(),
        "Min. Stok".into(),
        "Saran Order".into(),
    ]];
    for row in rows {
        sheet_rows.push(vec![
            row.product_code.clone().into(),
            row.product_name.clone().into(),
            row.category.clone().into(),
            row.current_stock.into(),
            row.min_stock.into(),
            row.suggested_order_qty.into(),
        ]);
    }
    write_book(
        path,
        "Stok Menipis",
        sheet_rows,
        &[15.0, 30.0, 15.0, 12.0, 12.0, 12.0],
    )
}

/// Per-product inbound/outbound movement over a period.
pub fn export_movement(
    path: &Path,
    rows: &[MovementRow],
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(), ServiceError> {
    let window = format!("{from} s/d {to}");
    let mut sheet_rows = vec![vec![
        "Kode Barang".into(),
        "Nama Produk".into(),
        "Kategori".into(),
        format!("Masuk ({window})").into(),
        format!("Keluar ({window})").into(),
        "Stok Akhir".into(),
    ]];
    for row in rows {
        sheet_rows.push(vec![
            row.product_code.clone().into(),
            row.product_name.clone().into(),
            row.category.clone().into(),
            row.qty_in.into(),
            row.qty_out.into(),
            row.ending_stock.into(),
        ]);
    }
    write_book(
        path,
        "Keluar Masuk",
        sheet_rows,
        &[15.0, 30.0, 15.0, 20.0, 20.0, 12.0],
    )
}
