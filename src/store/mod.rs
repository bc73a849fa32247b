use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth;
use crate::config::CompanyDefaults;
use crate::errors::ServiceError;
use crate::models::{
    CompanySettings, Order, Partner, Product, Role, StockOpname, StorageLocation, Transaction,
    User,
};

pub mod persistence;

pub use persistence::{JsonFileBackend, MemoryBackend, StorageBackend};

/// Named collections and their storage keys. The `inv_*` key names are a
/// stable contract so an existing data set keeps loading unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Products,
    Partners,
    Transactions,
    Opnames,
    Orders,
    Locations,
    Users,
    Settings,
    CurrentUser,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Products,
        Collection::Partners,
        Collection::Transactions,
        Collection::Opnames,
        Collection::Orders,
        Collection::Locations,
        Collection::Users,
        Collection::Settings,
        Collection::CurrentUser,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Collection::Products => "inv_products",
            Collection::Partners => "inv_partners",
            Collection::Transactions => "inv_transactions",
            Collection::Opnames => "inv_opnames",
            Collection::Orders => "inv_orders",
            Collection::Locations => "inv_locations",
            Collection::Users => "inv_all_users",
            Collection::Settings => "inv_settings",
            Collection::CurrentUser => "inv_current_user",
        }
    }
}

/// The whole application state. Transactions, orders, and opnames are kept
/// most-recent-first; insertion prepends.
#[derive(Debug, Default)]
pub struct AppData {
    pub products: Vec<Product>,
    pub partners: Vec<Partner>,
    pub transactions: Vec<Transaction>,
    pub opnames: Vec<StockOpname>,
    pub orders: Vec<Order>,
    pub locations: Vec<StorageLocation>,
    pub users: Vec<User>,
    pub settings: CompanySettings,
    pub current_user: Option<User>,
}

impl AppData {
    pub fn product(&self, id: uuid::Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn product_mut(&mut self, id: uuid::Uuid) -> Option<&mut Product> {
        self.products.iter_mut().find(|p| p.id == id)
    }

    pub fn partner(&self, id: uuid::Uuid) -> Option<&Partner> {
        self.partners.iter().find(|p| p.id == id)
    }
}

/// Owned store shared through the call graph: in-process state mirrored to a
/// [`StorageBackend`] after every mutation. Constructed once at process
/// start; no singleton.
pub struct StateStore {
    backend: Box<dyn StorageBackend>,
    state: RwLock<AppData>,
}

impl StateStore {
    /// Loads every collection from the backend. A missing key starts that
    /// collection empty (or at its default); an unparseable document is
    /// logged and treated as absent rather than aborting the session.
    pub fn open(
        backend: Box<dyn StorageBackend>,
        company: &CompanyDefaults,
    ) -> Result<Arc<Self>, ServiceError> {
        let mut state = AppData {
            products: load_or_default(backend.as_ref(), Collection::Products)?,
            partners: load_or_default(backend.as_ref(), Collection::Partners)?,
            transactions: load_or_default(backend.as_ref(), Collection::Transactions)?,
            opnames: load_or_default(backend.as_ref(), Collection::Opnames)?,
            orders: load_or_default(backend.as_ref(), Collection::Orders)?,
            locations: load_or_default(backend.as_ref(), Collection::Locations)?,
            users: Vec::new(),
            settings: match load_or_default::<Option<CompanySettings>>(
                backend.as_ref(),
                Collection::Settings,
            )? {
                Some(settings) => settings,
                None => CompanySettings::from(company),
            },
            current_user: load_or_default(backend.as_ref(), Collection::CurrentUser)?,
        };

        match backend.load(Collection::Users.key())? {
            Some(blob) => match serde_json::from_str(&blob) {
                Ok(users) => state.users = users,
                Err(err) => {
                    warn!(key = Collection::Users.key(), %err, "discarding unparseable collection");
                    state.users = default_users()?;
                }
            },
            // First launch: seed the stock account set.
            None => state.users = default_users()?,
        }

        let store = Self {
            backend,
            state: RwLock::new(state),
        };
        store.persist(Collection::Users, &store.state.read())?;
        info!(
            products = store.state.read().products.len(),
            transactions = store.state.read().transactions.len(),
            "state store opened"
        );
        Ok(Arc::new(store))
    }

    /// Ephemeral store for tests: memory backend, default company profile.
    pub fn in_memory() -> Arc<Self> {
        Self::open(Box::new(MemoryBackend::new()), &CompanyDefaults::default())
            .expect("memory-backed store cannot fail to open")
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppData) -> R) -> R {
        f(&self.state.read())
    }

    /// Runs a mutation and, on success, mirrors the touched collections back
    /// to the backend. Closures must perform all validation before touching
    /// state: an `Err` return skips persistence but does not roll back.
    pub fn mutate<R>(
        &self,
        touched: &[Collection],
        f: impl FnOnce(&mut AppData) -> Result<R, ServiceError>,
    ) -> Result<R, ServiceError> {
        let mut state = self.state.write();
        let out = f(&mut state)?;
        for collection in touched {
            self.persist(*collection, &state)?;
        }
        Ok(out)
    }

    /// Clears the backend and every in-memory collection, then re-seeds the
    /// default accounts and the given company profile.
    pub fn reset(&self, company: &CompanyDefaults) -> Result<(), ServiceError> {
        self.backend.clear()?;
        let mut state = self.state.write();
        *state = AppData {
            users: default_users()?,
            settings: CompanySettings::from(company),
            ..AppData::default()
        };
        for collection in Collection::ALL {
            self.persist(collection, &state)?;
        }
        info!("all application data reset");
        Ok(())
    }

    fn persist(&self, collection: Collection, state: &AppData) -> Result<(), ServiceError> {
        let key = collection.key();
        let blob = match collection {
            Collection::Products => serde_json::to_string(&state.products)?,
            Collection::Partners => serde_json::to_string(&state.partners)?,
            Collection::Transactions => serde_json::to_string(&state.transactions)?,
            Collection::Opnames => serde_json::to_string(&state.opnames)?,
            Collection::Orders => serde_json::to_string(&state.orders)?,
            Collection::Locations => serde_json::to_string(&state.locations)?,
            Collection::Users => serde_json::to_string(&state.users)?,
            Collection::Settings => serde_json::to_string(&state.settings)?,
            Collection::CurrentUser => match &state.current_user {
                Some(user) => serde_json::to_string(user)?,
                None => return self.backend.remove(key),
            },
        };
        self.backend.save(key, &blob)
    }
}

fn load_or_default<T: DeserializeOwned + Default>(
    backend: &dyn StorageBackend,
    collection: Collection,
) -> Result<T, ServiceError> {
    let key = collection.key();
    match backend.load(key)? {
        None => Ok(T::default()),
        Some(blob) => match serde_json::from_str(&blob) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(key, %err, "discarding unparseable collection");
                Ok(T::default())
            }
        },
    }
}

/// Seed accounts for a fresh install. All start with password `123`, the
/// development default; production deployments rotate them on first login.
fn default_users() -> Result<Vec<User>, ServiceError> {
    const SEED: [(&str, &str, Role); 5] = [
        ("admin", "Super Admin", Role::Admin),
        ("inventory", "Staf Gudang", Role::Inventory),
        ("ppic", "Staf PPIC", Role::Ppic),
        ("project", "Staf Project", Role::Project),
        ("manager", "Bapak Manager", Role::Manager),
    ];
    SEED.iter()
        .map(|(username, name, role)| {
            Ok(User {
                username: (*username).to_string(),
                name: (*name).to_string(),
                role: *role,
                password_hash: auth::hash_password("123")?,
            })
        })
        .collect()
}
