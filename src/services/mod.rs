use std::sync::Arc;

use crate::config::CompanyDefaults;
use crate::events::EventSender;
use crate::store::StateStore;

pub mod catalog;
pub mod locations;
pub mod opname;
pub mod orders;
pub mod partners;
pub mod reports;
pub mod restock;
pub mod settings;
pub mod transactions;
pub mod users;

pub use catalog::{CatalogService, ProductDraft, ProductFilter};
pub use locations::LocationService;
pub use opname::OpnameService;
pub use orders::{OrderDraft, OrderService};
pub use partners::{PartnerDraft, PartnerService};
pub use reports::{
    AdvisorySummary, DashboardStats, LowStockRow, MovementRow, RecentTransactionDigest,
    ReportService,
};
pub use restock::{RestockOutcome, RestockPlan, RestockService, SupplierGroup};
pub use settings::SettingsService;
pub use transactions::{available_stock, ItemDraft, TransactionDraft, TransactionService};
pub use users::{UserDraft, UserService, UserUpdate};

/// Every service wired over one shared store and event feed. Constructed
/// once and passed through the call graph.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub partners: PartnerService,
    pub locations: LocationService,
    pub transactions: TransactionService,
    pub orders: OrderService,
    pub restock: RestockService,
    pub opname: OpnameService,
    pub reports: ReportService,
    pub users: UserService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(
        store: Arc<StateStore>,
        event_sender: EventSender,
        defaults: CompanyDefaults,
    ) -> Self {
        let orders = OrderService::new(store.clone(), event_sender.clone());
        Self {
            catalog: CatalogService::new(store.clone(), event_sender.clone()),
            partners: PartnerService::new(store.clone(), event_sender.clone()),
            locations: LocationService::new(store.clone(), event_sender.clone()),
            transactions: TransactionService::new(store.clone(), event_sender.clone()),
            restock: RestockService::new(store.clone(), orders.clone()),
            orders,
            opname: OpnameService::new(store.clone(), event_sender.clone()),
            reports: ReportService::new(store.clone()),
            users: UserService::new(store.clone(), event_sender.clone()),
            settings: SettingsService::new(store, event_sender, defaults),
        }
    }
}
