use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Role, User};
use crate::store::{Collection, StateStore};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserDraft {
    #[validate(length(min = 3, max = 40, message = "Username must be 3-40 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 120, message = "Display name is required"))]
    pub name: String,
    pub role: Role,
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: String,
}

/// Changes to an existing account. `password: None` keeps the stored hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserUpdate {
    pub username: String,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub password: Option<String>,
}

/// Account and session management. The session is a single current user
/// persisted under its own key, mirroring the one-tab execution model.
#[derive(Clone)]
pub struct UserService {
    store: Arc<StateStore>,
    event_sender: EventSender,
}

impl UserService {
    pub fn new(store: Arc<StateStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Verifies credentials and opens the session. The same error covers an
    /// unknown username and a wrong password.
    #[instrument(skip(self, password))]
    pub fn login(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        let user = self.store.mutate(&[Collection::CurrentUser], |state| {
            let user = state
                .users
                .iter()
                .find(|u| u.username == username)
                .filter(|u| auth::verify_password(&u.password_hash, password))
                .cloned()
                .ok_or_else(|| {
                    warn!(username, "failed login attempt");
                    ServiceError::AuthError("invalid username or password".into())
                })?;
            state.current_user = Some(user.clone());
            Ok(user)
        })?;

        info!(username = %user.username, role = %user.role, "user logged in");
        self.event_sender
            .send(Event::UserLoggedIn(user.username.clone()));
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), ServiceError> {
        let previous = self.store.mutate(&[Collection::CurrentUser], |state| {
            Ok(state.current_user.take())
        })?;
        if let Some(user) = previous {
            info!(username = %user.username, "user logged out");
            self.event_sender.send(Event::UserLoggedOut(user.username));
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.store.read(|state| state.current_user.clone())
    }

    #[instrument(skip(self, draft), fields(username = %draft.username))]
    pub fn add_user(&self, draft: UserDraft) -> Result<User, ServiceError> {
        draft.validate()?;
        let password_hash = auth::hash_password(&draft.password)?;

        let user = self.store.mutate(&[Collection::Users], |state| {
            if state.users.iter().any(|u| u.username == draft.username) {
                return Err(ServiceError::DuplicateEntry(format!(
                    "username \"{}\" already exists",
                    draft.username
                )));
            }
            let user = User {
                username: draft.username.clone(),
                name: draft.name.clone(),
                role: draft.role,
                password_hash,
            };
            state.users.push(user.clone());
            Ok(user)
        })?;

        info!(username = %user.username, role = %user.role, "user created");
        self.event_sender
            .send(Event::UserCreated(user.username.clone()));
        Ok(user)
    }

    /// Updates name, role, and optionally the password. When the update
    /// names the logged-in account, the live session is refreshed too.
    #[instrument(skip(self, update), fields(username = %update.username))]
    pub fn update_user(&self, update: UserUpdate) -> Result<User, ServiceError> {
        let password_hash = update
            .password
            .as_deref()
            .map(auth::hash_password)
            .transpose()?;

        let user = self.store.mutate(
            &[Collection::Users, Collection::CurrentUser],
            |state| {
                let stored = state
                    .users
                    .iter_mut()
                    .find(|u| u.username == update.username)
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("user {}", update.username))
                    })?;
                stored.name = update.name.clone();
                stored.role = update.role;
                if let Some(hash) = password_hash {
                    stored.password_hash = hash;
                }
                let updated = stored.clone();

                if state
                    .current_user
                    .as_ref()
                    .is_some_and(|u| u.username == updated.username)
                {
                    state.current_user = Some(updated.clone());
                }
                Ok(updated)
            },
        )?;

        self.event_sender
            .send(Event::UserUpdated(user.username.clone()));
        Ok(user)
    }

    /// Removes an account. The account currently logged in cannot delete
    /// itself.
    #[instrument(skip(self))]
    pub fn delete_user(&self, username: &str) -> Result<bool, ServiceError> {
        let removed = self.store.mutate(&[Collection::Users], |state| {
            if state
                .current_user
                .as_ref()
                .is_some_and(|u| u.username == username)
            {
                return Err(ServiceError::InvalidOperation(
                    "cannot delete the account that is currently logged in".into(),
                ));
            }
            let before = state.users.len();
            state.users.retain(|u| u.username != username);
            Ok(state.users.len() != before)
        })?;

        if removed {
            self.event_sender
                .send(Event::UserDeleted(username.to_string()));
        }
        Ok(removed)
    }

    pub fn list(&self) -> Vec<User> {
        self.store.read(|state| state.users.clone())
    }
}
