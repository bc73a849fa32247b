//! # gudang-core
//!
//! Core library of a warehouse inventory application: product catalog,
//! stock movements with undo-correct reversal, purchase/sales orders with a
//! status lifecycle, stock opname (physical count reconciliation), partner
//! and account management, reporting aggregates, and spreadsheet export.
//!
//! The crate is a library, not a service: all state lives in one
//! [`store::StateStore`] mirrored to a key-value persistence backend as
//! whole-collection JSON documents. Operations are synchronous and intended
//! for a single writer; there is no cross-operation transaction or
//! concurrency control beyond the store's lock.
//!
//! Authorization is a caller concern: [`auth`] publishes the role/permission
//! map, and the surrounding application checks it before invoking mutating
//! operations. The services themselves accept any caller.

pub mod advisor;
pub mod auth;
pub mod config;
pub mod errors;
pub mod events;
pub mod export;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::services::AppServices;
use crate::store::{JsonFileBackend, StateStore};

/// The application assembled: configuration, shared store, event feed, and
/// every service. Build one at process start and pass it (or clones of the
/// services it holds) through the call graph.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<StateStore>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    /// Opens the store on the configured data directory and wires the
    /// services.
    pub fn bootstrap(config: AppConfig) -> Result<Self, ServiceError> {
        let backend = JsonFileBackend::new(&config.data_dir)?;
        let store = StateStore::open(Box::new(backend), &config.company)?;
        let event_sender = EventSender::new();
        let services = AppServices::new(store.clone(), event_sender.clone(), config.company.clone());
        Ok(Self {
            config,
            store,
            event_sender,
            services,
        })
    }

    /// Fully in-memory assembly for tests and embedding.
    pub fn in_memory() -> Self {
        let config = AppConfig::default();
        let store = StateStore::in_memory();
        let event_sender = EventSender::new();
        let services = AppServices::new(store.clone(), event_sender.clone(), config.company.clone());
        Self {
            config,
            store,
            event_sender,
            services,
        }
    }
}

pub mod prelude {
    pub use crate::advisor::{Advisor, OfflineAdvisor};
    pub use crate::auth::{Permission, RoleExt};
    pub use crate::config::AppConfig;
    pub use crate::errors::{ServiceError, StockShortage};
    pub use crate::events::{Event, EventSender};
    pub use crate::models::{
        CompanySettings, OpnameItem, OpnameStatus, Order, OrderStatus, OrderType, Partner,
        PartnerType, Product, Role, StockOpname, StorageLocation, Transaction, TransactionItem,
        TransactionType, User,
    };
    pub use crate::services::{
        available_stock, AdvisorySummary, AppServices, CatalogService, DashboardStats, ItemDraft,
        LocationService, LowStockRow, MovementRow, OpnameService, OrderDraft, OrderService,
        PartnerDraft, PartnerService, ProductDraft, ProductFilter, ReportService, RestockOutcome,
        RestockPlan, RestockService, SettingsService, TransactionDraft, TransactionService,
        UserDraft, UserService, UserUpdate,
    };
    pub use crate::store::{StateStore, StorageBackend};
    pub use crate::AppState;
}
