use crate::cart::CartReconciler;
use crate::checkout::Checkout;
use crate::orders::{AdminOrders, CustomerOrders};
use crate::reviews::Reviews;
use std::sync::Arc;
use storefront_core::{
    ApiError, ClientConfig, HttpBackend, SandboxBackend, SandboxHandle, Session, SharedBackend,
};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Every controller of the storefront, wired to one backend and one session.
///
/// # Example
///
/// ```ignore
/// let (storefront, sandbox) = Storefront::sandbox(&ClientConfig::default(), session);
/// let sofa = sandbox.seed_product("Sofa", 900.0, 3).await?;
/// storefront.cart.add_product(sofa, 1).await?;
/// storefront.shutdown().await?;
/// ```
pub struct Storefront {
    pub session: Arc<Session>,
    pub cart: CartReconciler,
    pub checkout: Checkout,
    pub orders: CustomerOrders,
    pub admin: AdminOrders,
    pub reviews: Reviews,

    backend: SharedBackend,

    /// Task handles for backend actors (used for graceful shutdown)
    handles: Vec<JoinHandle<()>>,
}

impl Storefront {
    /// Starts an in-process sandbox backend and wires the controllers to it.
    ///
    /// Returns the storefront and the handle used to seed the sandbox.
    pub fn sandbox(config: &ClientConfig, session: Arc<Session>) -> (Self, SandboxHandle) {
        let (actor, backend, handle) = SandboxBackend::new(config.channel_buffer);
        let task = tokio::spawn(actor.run());
        info!("Storefront started against the sandbox backend");
        (
            Self::assemble(Arc::new(backend), session, config, vec![task]),
            handle,
        )
    }

    /// Wires the controllers to the REST backend at `config.base_url`.
    pub fn http(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let backend = HttpBackend::new(config.clone(), session.clone())?;
        info!(base_url = %config.base_url, "Storefront started against HTTP backend");
        Ok(Self::assemble(Arc::new(backend), session, config, Vec::new()))
    }

    fn assemble(
        backend: SharedBackend,
        session: Arc<Session>,
        config: &ClientConfig,
        handles: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            cart: CartReconciler::new(backend.clone(), session.clone(), config.notice_ttl),
            checkout: Checkout::new(backend.clone(), session.clone()),
            orders: CustomerOrders::new(backend.clone(), config.notice_ttl),
            admin: AdminOrders::new(backend.clone()),
            reviews: Reviews::new(backend.clone(), session.clone()),
            session,
            backend,
            handles,
        }
    }

    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }

    /// Recomputes the navbar cart count from the server.
    pub async fn refresh_cart_count(&self) -> u32 {
        self.session.refresh_cart_count(self.backend.as_ref()).await
    }

    /// Gracefully shuts down the storefront.
    ///
    /// Drops every backend handle so the sandbox actor (if any) sees its
    /// channel close, then waits for it to finish.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down storefront...");

        drop(self.cart);
        drop(self.checkout);
        drop(self.orders);
        drop(self.admin);
        drop(self.reviews);
        drop(self.backend);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Backend task failed: {:?}", e);
                return Err(format!("Backend task failed: {:?}", e));
            }
        }

        info!("Storefront shutdown complete.");
        Ok(())
    }
}
