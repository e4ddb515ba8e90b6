//! Session context: the bearer token, the signed-in user and the navbar cart
//! count.
//!
//! Persisted state lives behind a [`SessionStore`] so the token survives
//! restarts wherever the host keeps it. The HTTP transport reads the token
//! from here and calls [`Session::invalidate`] when the backend answers `401`.

use crate::backend::StorefrontBackend;
use crate::model::{Cart, SessionUser};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

pub const TOKEN_KEY: &str = "accessToken";
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to encode session user: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisted key/value storage for the session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// A [`SessionStore`] that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[derive(Debug, Default, Clone)]
struct Credentials {
    token: Option<String>,
    user: Option<SessionUser>,
}

/// Shared session context, usually held as `Arc<Session>`.
pub struct Session {
    store: Arc<dyn SessionStore>,
    credentials: RwLock<Credentials>,
    cart_count: AtomicU32,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("signed_in", &self.token().is_some())
            .field("cart_count", &self.cart_count())
            .finish()
    }
}

impl Session {
    /// Reads the persisted token and user. A user entry that no longer
    /// decodes is dropped.
    pub fn restore(store: Arc<dyn SessionStore>) -> Self {
        let token = store.get(TOKEN_KEY);
        let user = store
            .get(USER_KEY)
            .and_then(|raw| match serde_json::from_str::<SessionUser>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable persisted user");
                    store.remove(USER_KEY);
                    None
                }
            });
        debug!(signed_in = token.is_some(), "Session restored");
        Self {
            store,
            credentials: RwLock::new(Credentials { token, user }),
            cart_count: AtomicU32::new(0),
        }
    }

    /// A session with nothing persisted, backed by memory.
    pub fn anonymous() -> Self {
        Self::restore(Arc::new(MemorySessionStore::default()))
    }

    pub fn login(&self, token: impl Into<String>, user: SessionUser) -> Result<(), SessionError> {
        let token = token.into();
        self.store.set(USER_KEY, serde_json::to_string(&user)?);
        self.store.set(TOKEN_KEY, token.clone());
        info!(user_id = user.id, role = ?user.role, "Signed in");
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = Credentials {
            token: Some(token),
            user: Some(user),
        };
        Ok(())
    }

    /// Explicit sign-out: clears persisted state and the cached count.
    pub fn logout(&self) {
        self.clear();
        info!("Signed out");
    }

    /// Called by the transport when the backend rejects the token.
    pub fn invalidate(&self) {
        if self.token().is_some() {
            warn!("Session expired; clearing credentials");
        }
        self.clear();
    }

    fn clear(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = Credentials::default();
        self.cart_count.store(0, Ordering::Relaxed);
    }

    pub fn token(&self) -> Option<String> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(|user| user.is_admin())
    }

    /// Units in the cart, as last observed.
    pub fn cart_count(&self) -> u32 {
        self.cart_count.load(Ordering::Relaxed)
    }

    /// Updates the count from a cart the backend just returned.
    pub fn sync_cart_count(&self, cart: &Cart) {
        if self.counts_cart() {
            self.cart_count.store(cart.item_count(), Ordering::Relaxed);
        }
    }

    fn counts_cart(&self) -> bool {
        self.token().is_some() && !self.is_admin()
    }

    /// Re-reads the cart and recomputes the count.
    ///
    /// Anonymous and admin sessions count zero without a request. Any
    /// failure also resets the count to zero.
    pub async fn refresh_cart_count(&self, backend: &dyn StorefrontBackend) -> u32 {
        if !self.counts_cart() {
            self.cart_count.store(0, Ordering::Relaxed);
            return 0;
        }
        let count = match backend.get_cart().await {
            Ok(cart) => cart.item_count(),
            Err(e) => {
                debug!(error = %e, "Cart count refresh failed");
                0
            }
        };
        self.cart_count.store(count, Ordering::Relaxed);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    fn customer() -> SessionUser {
        SessionUser::new(1, "an@example.com", Role::User)
    }

    #[test]
    fn test_login_persists_and_restore_reads_back() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::default());
        let session = Session::restore(store.clone());
        assert!(session.token().is_none());

        session.login("jwt-1", customer()).unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("jwt-1"));

        let restored = Session::restore(store);
        assert_eq!(restored.token().as_deref(), Some("jwt-1"));
        assert_eq!(restored.user().unwrap().email, "an@example.com");
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::default());
        let session = Session::restore(store.clone());
        session.login("jwt-1", customer()).unwrap();
        session.sync_cart_count(&Cart::default());

        session.invalidate();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(store.get(USER_KEY).is_none());
        assert_eq!(session.cart_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_cart_count_sums_quantities() {
        use crate::mock::MockBackend;
        use crate::model::{CartItemId, CartLine, Product, ProductId};

        let mock = MockBackend::new();
        mock.expect_get_cart().return_ok(Cart::from_lines(vec![
            CartLine::new(CartItemId(1), Product::new(ProductId(1), "Bàn", 10.0, 9), 2),
            CartLine::new(CartItemId(2), Product::new(ProductId(2), "Ghế", 5.0, 9), 3),
        ]));
        mock.expect_get_cart()
            .return_err(crate::error::ApiError::Transport("reset".into()));

        let session = Session::anonymous();
        session.login("jwt", customer()).unwrap();
        let backend = mock.backend();

        assert_eq!(session.refresh_cart_count(&backend).await, 5);
        assert_eq!(session.cart_count(), 5);
        assert_eq!(session.refresh_cart_count(&backend).await, 0);
        mock.verify();
    }

    #[tokio::test]
    async fn test_refresh_cart_count_skips_admin_and_anonymous() {
        use crate::mock::MockBackend;

        let mock = MockBackend::new();
        let backend = mock.backend();

        let anonymous = Session::anonymous();
        assert_eq!(anonymous.refresh_cart_count(&backend).await, 0);

        let admin = Session::anonymous();
        admin
            .login("jwt", SessionUser::new(9, "admin@example.com", Role::Admin))
            .unwrap();
        assert_eq!(admin.refresh_cart_count(&backend).await, 0);

        assert!(mock.routes().is_empty());
        mock.verify();
    }

    #[test]
    fn test_corrupt_user_entry_is_dropped() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::default());
        store.set(TOKEN_KEY, "jwt".into());
        store.set(USER_KEY, "{not json".into());

        let session = Session::restore(store.clone());
        assert!(session.user().is_none());
        assert!(store.get(USER_KEY).is_none());
    }
}
