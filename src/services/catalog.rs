use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::Product;
use crate::store::{Collection, StateStore};

/// A catalog entry being created.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 50, message = "Product code is required"))]
    pub code: String,
    #[validate(length(min = 1, max = 120, message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[validate(length(min = 1, message = "Unit is required"))]
    pub unit: String,
    #[validate(range(min = 0, message = "Minimum stock must not be negative"))]
    pub min_stock: i64,
    pub price: Decimal,
    #[serde(default)]
    pub location_id: Option<Uuid>,
}

/// Search criteria for the catalog views.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Matched case-insensitively against code and name.
    pub term: Option<String>,
    pub category: Option<String>,
    pub location_id: Option<Uuid>,
    pub low_stock_only: bool,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Product catalog CRUD and queries.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl CatalogService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self, draft), fields(code = %draft.code))]
    pub fn add_product(&self, draft: ProductDraft) -> Result<Product, ServiceError> {
        draft.validate()?;
        if draft.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must not be negative".into(),
            ));
        }

        let product = self.store.mutate(&[Collection::Products], |state| {
            let product = Product::new(
                draft.code.clone(),
                draft.name.clone(),
                draft.category.clone(),
                draft.unit.clone(),
                draft.min_stock,
                draft.price,
                draft.location_id,
            );
            state.products.push(product.clone());
            Ok(product)
        })?;

        info!(product_id = %product.id, code = %product.code, "product created");
        self.event_sender.send(Event::ProductCreated(product.id));
        Ok(product)
    }

    /// Replaces a catalog entry wholesale, `current_stock` included — the
    /// edit form round-trips the full record.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn update_product(&self, product: Product) -> Result<Product, ServiceError> {
        if product.name.trim().is_empty() || product.code.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Product code and name are required".into(),
            ));
        }

        let product = self.store.mutate(&[Collection::Products], |state| {
            let stored = state
                .product_mut(product.id)
                .ok_or_else(|| ServiceError::NotFound(format!("product {}", product.id)))?;
            *stored = product.clone();
            Ok(product)
        })?;

        self.event_sender.send(Event::ProductUpdated(product.id));
        Ok(product)
    }

    /// Removes a product from the catalog. Never blocked by history and
    /// never cascading into it: transactions and orders keep their snapshot
    /// lines, which from then on resolve as "not found".
    #[instrument(skip(self))]
    pub fn delete_product(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.store.mutate(&[Collection::Products], |state| {
            let before = state.products.len();
            state.products.retain(|p| p.id != id);
            Ok(state.products.len() != before)
        })?;
        if removed {
            self.event_sender.send(Event::ProductDeleted(id));
        }
        Ok(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<Product> {
        self.store.read(|state| state.product(id).cloned())
    }

    pub fn list(&self) -> Vec<Product> {
        self.store.read(|state| state.products.clone())
    }

    pub fn search(&self, filter: &ProductFilter) -> Vec<Product> {
        let term = filter.term.as_ref().map(|t| t.to_lowercase());
        self.store.read(|state| {
            state
                .products
                .iter()
                .filter(|p| {
                    let matches_term = term.as_ref().map_or(true, |t| {
                        p.code.to_lowercase().contains(t) || p.name.to_lowercase().contains(t)
                    });
                    let matches_category =
                        filter.category.as_ref().map_or(true, |c| &p.category == c);
                    let matches_location = filter
                        .location_id
                        .map_or(true, |l| p.location_id == Some(l));
                    let matches_low = !filter.low_stock_only || p.is_low_stock();
                    let matches_min = filter.min_price.map_or(true, |min| p.price >= min);
                    let matches_max = filter.max_price.map_or(true, |max| p.price <= max);
                    matches_term
                        && matches_category
                        && matches_location
                        && matches_low
                        && matches_min
                        && matches_max
                })
                .cloned()
                .collect()
        })
    }

    pub fn low_stock(&self) -> Vec<Product> {
        self.store.read(|state| {
            state
                .products
                .iter()
                .filter(|p| p.is_low_stock())
                .cloned()
                .collect()
        })
    }

    /// Distinct categories, sorted, empty strings dropped.
    pub fn categories(&self) -> Vec<String> {
        self.store.read(|state| {
            let mut categories: Vec<String> = state
                .products
                .iter()
                .map(|p| p.category.clone())
                .filter(|c| !c.is_empty())
                .collect();
            categories.sort();
            categories.dedup();
            categories
        })
    }
}
