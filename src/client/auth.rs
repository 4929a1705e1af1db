//! Bearer token source
//!
//! The client only reads tokens. Whoever owns the session (login flow,
//! refresh logic) writes them.

use std::sync::{PoisonError, RwLock};

/// External key-value store holding the current bearer token
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Anonymous access
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToken;

impl TokenStore for NoToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// In-process token slot
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryTokenStore::default();
        assert_eq!(store.token(), None);

        store.set("abc");
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.set("");
        assert_eq!(store.token(), None);

        store.set("xyz");
        store.clear();
        assert_eq!(store.token(), None);
    }
}
