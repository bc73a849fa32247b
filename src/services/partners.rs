use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Partner, PartnerType};
use crate::store::{Collection, StateStore};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PartnerDraft {
    #[validate(length(min = 1, max = 120, message = "Partner name is required"))]
    pub name: String,
    pub partner_type: PartnerType,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub address: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Supplier and customer registry.
#[derive(Clone)]
pub struct PartnerService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl PartnerService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name, partner_type = %draft.partner_type))]
    pub fn add_partner(&self, draft: PartnerDraft) -> Result<Partner, ServiceError> {
        draft.validate()?;
        let partner = self.store.mutate(&[Collection::Partners], |state| {
            let partner = Partner::new(
                draft.name.clone(),
                draft.partner_type,
                draft.contact.clone(),
                draft.address.clone(),
                draft.email.clone(),
            );
            state.partners.push(partner.clone());
            Ok(partner)
        })?;

        info!(partner_id = %partner.id, "partner created");
        self.event_sender.send(Event::PartnerCreated(partner.id));
        Ok(partner)
    }

    pub fn update_partner(&self, partner: Partner) -> Result<Partner, ServiceError> {
        if partner.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Partner name is required".into(),
            ));
        }
        let partner = self.store.mutate(&[Collection::Partners], |state| {
            let stored = state
                .partners
                .iter_mut()
                .find(|p| p.id == partner.id)
                .ok_or_else(|| ServiceError::NotFound(format!("partner {}", partner.id)))?;
            *stored = partner.clone();
            Ok(partner)
        })?;
        self.event_sender.send(Event::PartnerUpdated(partner.id));
        Ok(partner)
    }

    /// No cascade: transactions and orders keep their partner ids, which
    /// afterwards resolve as "not found".
    #[instrument(skip(self))]
    pub fn delete_partner(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.store.mutate(&[Collection::Partners], |state| {
            let before = state.partners.len();
            state.partners.retain(|p| p.id != id);
            Ok(state.partners.len() != before)
        })?;
        if removed {
            self.event_sender.send(Event::PartnerDeleted(id));
        }
        Ok(removed)
    }

    pub fn get(&self, id: Uuid) -> Option<Partner> {
        self.store.read(|state| state.partner(id).cloned())
    }

    pub fn list(&self) -> Vec<Partner> {
        self.store.read(|state| state.partners.clone())
    }

    pub fn list_by_type(&self, partner_type: PartnerType) -> Vec<Partner> {
        self.store.read(|state| {
            state
                .partners
                .iter()
                .filter(|p| p.partner_type == partner_type)
                .cloned()
                .collect()
        })
    }

    pub fn suppliers(&self) -> Vec<Partner> {
        self.list_by_type(PartnerType::Supplier)
    }

    pub fn customers(&self) -> Vec<Partner> {
        self.list_by_type(PartnerType::Customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> PartnerService {
        PartnerService::new(StateStore::in_memory(), EventSender::new())
    }

    fn draft(name: &str, partner_type: PartnerType) -> PartnerDraft {
        PartnerDraft {
            name: name.into(),
            partner_type,
            contact: "0811".into(),
            address: "Bandung".into(),
            email: "info@partner.id".into(),
        }
    }

    #[test]
    fn partners_are_filtered_by_type() {
        let partners = service();
        partners
            .add_partner(draft("CV Sumber Baja", PartnerType::Supplier))
            .unwrap();
        partners
            .add_partner(draft("Toko Jaya", PartnerType::Customer))
            .unwrap();

        assert_eq!(partners.suppliers().len(), 1);
        assert_eq!(partners.customers().len(), 1);
        assert_eq!(partners.suppliers()[0].name, "CV Sumber Baja");
    }

    #[test]
    fn invalid_email_is_rejected() {
        let partners = service();
        let mut d = draft("CV Sumber Baja", PartnerType::Supplier);
        d.email = "not-an-email".into();
        assert_matches!(
            partners.add_partner(d),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let partners = service();
        let partner = partners
            .add_partner(draft("CV Sumber Baja", PartnerType::Supplier))
            .unwrap();
        assert!(partners.delete_partner(partner.id).unwrap());
        assert!(!partners.delete_partner(partner.id).unwrap());
    }
}
