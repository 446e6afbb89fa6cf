/// Signed-in session state.
///
/// A session is created from the backend's login response and dropped at
/// logout. The lifecycle code only ever reads it.

use crate::models::Role;
use serde::Deserialize;
use std::fmt;
use tracing::info;
use uuid::Uuid;

/// Body returned by `POST /api/auth/login`.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Credential and identity of the signed-in viewer.
///
/// The bearer token is opaque; it is never parsed or refreshed here.
#[derive(Clone)]
pub struct Session {
    session_id: Uuid,
    token: String,
    user_id: i64,
    role: Role,
    display_name: String,
}

impl Session {
    pub fn new(token: String, user_id: i64, role: Role, display_name: String) -> Self {
        Session {
            session_id: Uuid::new_v4(),
            token,
            user_id,
            role,
            display_name,
        }
    }

    pub fn from_login(response: LoginResponse) -> Self {
        let display_name = response
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("User {}", response.user_id));
        Session::new(response.token, response.user_id, response.role, display_name)
    }

    /// Local identifier used to correlate log lines; never sent to the backend.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Holds at most one session between login and logout.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: Option<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session, replacing any previous one.
    pub fn login(&mut self, response: LoginResponse) -> &Session {
        let session = Session::from_login(response);
        info!(
            session_id = %session.session_id(),
            user_id = session.user_id(),
            role = %session.role(),
            "session started"
        );
        self.current.insert(session)
    }

    /// End the current session. Returns whether one was active.
    pub fn logout(&mut self) -> bool {
        match self.current.take() {
            Some(session) => {
                info!(session_id = %session.session_id(), "session ended");
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}
