use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named storage area, e.g. "Gudang Utama - Rak A". Name uniqueness is
/// checked case-insensitively at the service entry point, not here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl StorageLocation {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
        }
    }
}
