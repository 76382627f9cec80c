//! Session context injected into the orchestrator

use parking_lot::RwLock;

/// Credentials and identity supplied by the surrounding application.
///
/// The orchestrator only reads from it, and clears it when the backend
/// rejects the token.
pub trait SessionContext: Send + Sync {
    /// Bearer token attached to backend requests
    fn access_token(&self) -> Option<String>;

    /// Long-lived token handed to the export collaborator
    fn refresh_token(&self) -> Option<String>;

    /// Identifier sent with fresh queries
    fn user_id(&self) -> Option<String>;

    /// Forget all credentials
    fn clear(&self);
}

/// Stored credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
}

/// In-memory session, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySession {
    inner: RwLock<Credentials>,
}

impl MemorySession {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }

    /// Session with no credentials at all
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn credentials(&self) -> Credentials {
        self.inner.read().clone()
    }
}

impl SessionContext for MemorySession {
    fn access_token(&self) -> Option<String> {
        self.inner.read().access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.read().refresh_token.clone()
    }

    fn user_id(&self) -> Option<String> {
        self.inner.read().user_id.clone()
    }

    fn clear(&self) {
        *self.inner.write() = Credentials::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_session_clear() {
        let session = MemorySession::new(Credentials {
            access_token: Some("a".into()),
            refresh_token: Some("r".into()),
            user_id: Some("ana@example.com".into()),
        });
        assert_eq!(session.access_token().as_deref(), Some("a"));
        assert_eq!(session.user_id().as_deref(), Some("ana@example.com"));

        session.clear();
        assert_eq!(session.credentials(), Credentials::default());
    }
}
