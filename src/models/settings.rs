use serde::{Deserialize, Serialize};

use crate::config::CompanyDefaults;

/// Flat company profile used on printed documents and exports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySettings {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub currency: String,
}

impl From<&CompanyDefaults> for CompanySettings {
    fn from(defaults: &CompanyDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            address: defaults.address.clone(),
            phone: defaults.phone.clone(),
            email: defaults.email.clone(),
            logo_url: None,
            currency: defaults.currency.clone(),
        }
    }
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self::from(&CompanyDefaults::default())
    }
}
