//! Shared fixture for the integration suite.

use gudang_core::models::{Partner, PartnerType, Product};
use gudang_core::store::Collection;
use gudang_core::AppState;
use rust_decimal::Decimal;
use uuid::Uuid;

pub struct TestApp {
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            state: AppState::in_memory(),
        }
    }

    /// Seeds a catalog entry at a given stock level, bypassing the ledger.
    pub fn seed_product(
        &self,
        code: &str,
        name: &str,
        min_stock: i64,
        price: Decimal,
        current_stock: i64,
    ) -> Product {
        let mut product = Product::new(code, name, "Parts", "Pcs", min_stock, price, None);
        product.current_stock = current_stock;
        let snapshot = product.clone();
        self.state
            .store
            .mutate(&[Collection::Products], |state| {
                state.products.push(product);
                Ok(())
            })
            .expect("seed product");
        snapshot
    }

    pub fn seed_partner(&self, name: &str, partner_type: PartnerType) -> Partner {
        let partner = Partner::new(name, partner_type, "0811", "Bandung", "info@partner.id");
        let snapshot = partner.clone();
        self.state
            .store
            .mutate(&[Collection::Partners], |state| {
                state.partners.push(partner);
                Ok(())
            })
            .expect("seed partner");
        snapshot
    }

    pub fn stock_of(&self, product_id: Uuid) -> i64 {
        self.state
            .store
            .read(|state| state.product(product_id).expect("product").current_stock)
    }
}
