use serde::{Deserialize, Serialize};

/// Application roles. These gate which operations the surrounding caller
/// exposes (see `crate::auth`); the ledger itself never checks them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Inventory,
    Ppic,
    Project,
    Manager,
}

/// An application account. The username is the unique key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub name: String,
    pub role: Role,
    /// Argon2 hash. The session copy persisted under the current-user key
    /// carries it too; it is never the cleartext.
    pub password_hash: String,
}

impl User {
    /// Display form without the credential, for logs and UI surfaces.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.role)
    }
}
