use std::sync::Arc;
use tracing::{info, instrument};

use crate::config::CompanyDefaults;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::CompanySettings;
use crate::store::{Collection, StateStore};

/// Company settings plus the full data reset.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<StateStore>,
    event_sender: EventSender,
    defaults: CompanyDefaults,
}

impl SettingsService {
    pub fn new(
        store: Arc<StateStore>,
        event_sender: EventSender,
        defaults: CompanyDefaults,
    ) -> Self {
        Self {
            store,
            event_sender,
            defaults,
        }
    }

    pub fn get(&self) -> CompanySettings {
        self.store.read(|state| state.settings.clone())
    }

    #[instrument(skip(self, settings))]
    pub fn update(&self, settings: CompanySettings) -> Result<CompanySettings, ServiceError> {
        if settings.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Company name is required".into(),
            ));
        }
        let settings = self.store.mutate(&[Collection::Settings], |state| {
            state.settings = settings.clone();
            Ok(settings)
        })?;
        self.event_sender.send(Event::SettingsUpdated);
        Ok(settings)
    }

    /// Wipes every collection and the backing storage, then re-seeds the
    /// defaults. The caller is responsible for having confirmed this with
    /// the user; once invoked it proceeds unconditionally.
    #[instrument(skip(self))]
    pub fn reset_data(&self) -> Result<(), ServiceError> {
        self.store.reset(&self.defaults)?;
        info!("application data reset to defaults");
        self.event_sender.send(Event::DataReset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> SettingsService {
        SettingsService::new(
            StateStore::in_memory(),
            EventSender::new(),
            CompanyDefaults::default(),
        )
    }

    #[test]
    fn update_round_trips() {
        let settings = service();
        let mut current = settings.get();
        current.currency = "USD".into();
        settings.update(current).unwrap();
        assert_eq!(settings.get().currency, "USD");
    }

    #[test]
    fn blank_company_name_is_rejected() {
        let settings = service();
        let mut current = settings.get();
        current.name = "  ".into();
        assert_matches!(
            settings.update(current),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn reset_restores_default_settings() {
        let settings = service();
        let mut current = settings.get();
        current.currency = "USD".into();
        settings.update(current).unwrap();

        settings.reset_data().unwrap();
        assert_eq!(settings.get().currency, "IDR");
    }
}
