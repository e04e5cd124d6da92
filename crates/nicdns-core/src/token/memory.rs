// # Memory Token Store
//
// Keeps the most recent token in memory.
//
// Nothing survives a restart: a new process starts without a token and must
// authenticate with username and password again. Useful for tests and for
// short-lived tools where re-authentication is cheap.

use std::sync::{Arc, Mutex, PoisonError};

use super::{Token, TokenUpdater};

/// In-memory token updater
///
/// Clones share the same storage, so one clone can be handed to the client
/// while another is kept to inspect what was stored.
///
/// # Example
///
/// ```rust
/// use nicdns_core::token::{MemoryTokenStore, Token, TokenUpdater};
///
/// let store = MemoryTokenStore::new();
/// store.token_updated(&Token::new("abc"));
///
/// assert_eq!(store.update_count(), 1);
/// assert_eq!(store.token().unwrap().access_token, "abc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    token: Option<Token>,
    updates: usize,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// The last token received
    pub fn token(&self) -> Option<Token> {
        self.lock().token.clone()
    }

    /// Number of updates received
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    /// Forget the stored token (the update count is kept)
    pub fn clear(&self) {
        self.lock().token = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenUpdater for MemoryTokenStore {
    fn token_updated(&self, token: &Token) {
        let mut state = self.lock();
        state.token = Some(token.clone());
        state.updates += 1;
    }
}
