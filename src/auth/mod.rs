use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::models::Role;

/// Things a caller may ask the core to do. The core itself never checks
/// these; the surrounding application consults [`Role::allows`] before
/// exposing or invoking a mutating operation, which keeps the ledger
/// testable without an auth fixture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter)]
pub enum Permission {
    ManageCatalog,
    ManageTransactions,
    ManageOpname,
    ManageOrders,
    ApproveOrders,
    ManagePartners,
    ManageUsers,
    ManageSettings,
    ViewReports,
    ExportData,
    ResetData,
}

/// The role/capability mapping enforced by the application shell.
pub fn role_permissions(role: Role) -> &'static [Permission] {
    use Permission::*;
    match role {
        Role::Admin => &[
            ManageCatalog,
            ManageTransactions,
            ManageOpname,
            ManageOrders,
            ApproveOrders,
            ManagePartners,
            ManageUsers,
            ManageSettings,
            ViewReports,
            ExportData,
            ResetData,
        ],
        Role::Inventory => &[
            ManageCatalog,
            ManageTransactions,
            ManageOpname,
            ViewReports,
            ExportData,
        ],
        // PPIC and Project staff work the order book.
        Role::Ppic | Role::Project => &[ManageOrders, ViewReports, ExportData],
        Role::Manager => &[ApproveOrders, ViewReports, ExportData],
    }
}

pub trait RoleExt {
    fn allows(&self, permission: Permission) -> bool;
}

impl RoleExt for Role {
    fn allows(&self, permission: Permission) -> bool {
        role_permissions(*self).contains(&permission)
    }
}

/// Hashes a cleartext password with argon2 and a fresh salt.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::AuthError(format!("password hashing failed: {e}")))
}

/// Verifies a cleartext password against a stored hash. A malformed stored
/// hash counts as a failed verification, not an error.
pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("123").unwrap();
        assert!(verify_password(&hash, "123"));
        assert!(!verify_password(&hash, "321"));
        assert!(!verify_password("garbage", "123"));
    }

    #[test]
    fn admin_holds_every_permission() {
        use strum::IntoEnumIterator;
        for permission in Permission::iter() {
            assert!(Role::Admin.allows(permission), "admin missing {permission}");
        }
    }

    #[test_case(Role::Inventory, Permission::ManageCatalog => true)]
    #[test_case(Role::Inventory, Permission::ManageOpname => true)]
    #[test_case(Role::Inventory, Permission::ManageOrders => false)]
    #[test_case(Role::Ppic, Permission::ManageOrders => true)]
    #[test_case(Role::Ppic, Permission::ManageCatalog => false)]
    #[test_case(Role::Project, Permission::ManageOrders => true)]
    #[test_case(Role::Manager, Permission::ViewReports => true)]
    #[test_case(Role::Manager, Permission::ApproveOrders => true)]
    #[test_case(Role::Manager, Permission::ManageTransactions => false)]
    #[test_case(Role::Manager, Permission::ResetData => false)]
    fn permission_matrix(role: Role, permission: Permission) -> bool {
        role.allows(permission)
    }
}
