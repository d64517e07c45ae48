//! Authentication context shared by the HTTP clients.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretBox};

/// Bearer token holder, cheap to clone and shared between clients.
///
/// Clients read the token on every request. A 401 from the backend clears
/// it, so every client sharing the session sees the logout.
#[derive(Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<SecretBox<String>>>>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        let session = Self::default();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            session.set_token(token);
        }
        session
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: String) {
        *self.token.write() = Some(SecretBox::new(Box::new(token)));
    }

    /// Drop the token (logout)
    pub fn clear(&self) {
        if self.token.write().take().is_some() {
            tracing::info!("session cleared");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// `Authorization` header value for the current token, if any
    pub(crate) fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .as_ref()
            .map(|t| format!("Bearer {}", t.expose_secret()))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
