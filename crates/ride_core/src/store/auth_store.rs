//! Simulated authentication.
//!
//! Login and registration are mock round-trips: the store records the request,
//! the clock fires `AuthCompleted` after the configured delay, and the mock user
//! is installed. The resulting [`PersistedAuth`] blob is written to client
//! storage so a new session starts already signed in.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AuthError;
use crate::storage::{load_json, save_json, KeyValueStorage, AUTH_STORAGE_KEY};

pub const DEMO_USER_ID: &str = "1";
pub const MOCK_TOKEN: &str = "mock-jwt-token";
const DEMO_USER_NAME: &str = "Vikram Singh";
const DEMO_USER_PHONE: &str = "+91 98765 43210";
const DEFAULT_AVATAR: &str = "/assets/avatar-male-1.svg";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub avatar: Option<String>,
    /// Wall-clock milliseconds.
    pub created_at: i64,
}

/// Fields a profile edit may change; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Login { email: String },
    Register { name: String, email: String },
}

/// The part of the auth store that survives a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedAuth {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

#[derive(Debug, Default, Resource)]
pub struct AuthStore {
    user: Option<User>,
    token: Option<String>,
    is_authenticated: bool,
    pending: Option<AuthRequest>,
}

impl AuthStore {
    /// Restores a previous session. Unreadable state is logged and ignored.
    pub fn restore(storage: &dyn KeyValueStorage) -> Self {
        match load_json::<PersistedAuth>(storage, AUTH_STORAGE_KEY) {
            Ok(Some(persisted)) => Self {
                user: persisted.user,
                token: persisted.token,
                is_authenticated: persisted.is_authenticated,
                pending: None,
            },
            Ok(None) => Self::default(),
            Err(error) => {
                warn!(%error, "ignoring unreadable auth state");
                Self::default()
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn user_id(&self) -> &str {
        self.user.as_ref().map_or(DEMO_USER_ID, |user| user.id.as_str())
    }

    pub fn begin_login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.ensure_idle()?;
        let email = required(email, AuthError::MissingEmail)?;
        required(password, AuthError::MissingPassword)?;
        self.pending = Some(AuthRequest::Login { email });
        Ok(())
    }

    pub fn begin_register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        self.ensure_idle()?;
        let name = required(name, AuthError::MissingName)?;
        let email = required(email, AuthError::MissingEmail)?;
        required(password, AuthError::MissingPassword)?;
        self.pending = Some(AuthRequest::Register { name, email });
        Ok(())
    }

    /// Installs the mock user for the pending request. Returns `false` if nothing
    /// was pending.
    pub fn finish_auth(&mut self, created_at: i64) -> bool {
        let Some(request) = self.pending.take() else {
            return false;
        };
        let user = match request {
            AuthRequest::Login { email } => User {
                id: DEMO_USER_ID.to_string(),
                email,
                name: DEMO_USER_NAME.to_string(),
                phone: DEMO_USER_PHONE.to_string(),
                avatar: Some(DEFAULT_AVATAR.to_string()),
                created_at,
            },
            AuthRequest::Register { name, email } => User {
                id: DEMO_USER_ID.to_string(),
                email,
                name,
                phone: String::new(),
                avatar: Some(DEFAULT_AVATAR.to_string()),
                created_at,
            },
        };
        info!(email = %user.email, "signed in");
        self.user = Some(user);
        self.token = Some(MOCK_TOKEN.to_string());
        self.is_authenticated = true;
        true
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
        self.pending = None;
    }

    pub fn update_user(&mut self, patch: UserPatch) {
        let Some(user) = self.user.as_mut() else {
            return;
        };
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(phone) = patch.phone {
            user.phone = phone;
        }
        if let Some(avatar) = patch.avatar {
            user.avatar = Some(avatar);
        }
    }

    pub fn snapshot(&self) -> PersistedAuth {
        PersistedAuth {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated,
        }
    }

    /// Writes the persisted blob. Failures are logged; the in-memory state stays authoritative.
    pub fn persist(&self, storage: &mut dyn KeyValueStorage) {
        if let Err(error) = save_json(storage, AUTH_STORAGE_KEY, &self.snapshot()) {
            warn!(%error, "failed to persist auth state");
        }
    }

    fn ensure_idle(&self) -> Result<(), AuthError> {
        if self.pending.is_some() {
            return Err(AuthError::RequestInFlight);
        }
        Ok(())
    }
}

fn required(value: &str, error: AuthError) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed.to_string())
}
