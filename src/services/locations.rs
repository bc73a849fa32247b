use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::StorageLocation;
use crate::store::{Collection, StateStore};

/// Storage location registry. Names are unique case-insensitively, enforced
/// here at the entry point rather than as a storage constraint.
#[derive(Clone)]
pub struct LocationService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl LocationService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self), fields(%name))]
    pub fn add_location(
        &self,
        name: &str,
        description: &str,
    ) -> Result<StorageLocation, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Location name is required".into(),
            ));
        }

        let location = self.store.mutate(&[Collection::Locations], |state| {
            if state
                .locations
                .iter()
                .any(|l| l.name.eq_ignore_ascii_case(name))
            {
                return Err(ServiceError::DuplicateEntry(format!(
                    "location \"{name}\" already exists"
                )));
            }
            let location = StorageLocation::new(name, description);
            state.locations.push(location.clone());
            Ok(location)
        })?;

        info!(location_id = %location.id, "storage location created");
        self.event_sender.send(Event::LocationCreated(location.id));
        Ok(location)
    }

    /// Products keep their `location_id` when the location goes away; the
    /// dangling reference renders as a blank location, not an error.
    #[instrument(skip(self))]
    pub fn delete_location(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.store.mutate(&[Collection::Locations], |state| {
            let before = state.locations.len();
            state.locations.retain(|l| l.id != id);
            Ok(state.locations.len() != before)
        })?;
        if removed {
            self.event_sender.send(Event::LocationDeleted(id));
        }
        Ok(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<StorageLocation> {
        self.store
            .read(|state| state.locations.iter().find(|l| l.id == id).cloned())
    }

    pub fn list(&self) -> Vec<StorageLocation> {
        self.store.read(|state| state.locations.clone())
    }
}
