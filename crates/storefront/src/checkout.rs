//! Turning the selected cart lines into an order.

use std::sync::Arc;
use storefront_core::{
    Address, AddressId, ApiError, CartLine, ErrorKind, Order, PlaceOrder, Session, SharedBackend,
};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Vui lòng chọn ít nhất một sản phẩm để thanh toán.")]
    EmptySelection,
    #[error("Vui lòng thêm/chọn địa chỉ nhận hàng!")]
    MissingAddress,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::EmptySelection | CheckoutError::MissingAddress => ErrorKind::Local,
            CheckoutError::Api(e) => e.kind(),
        }
    }
}

pub struct Checkout {
    backend: SharedBackend,
    session: Arc<Session>,
}

impl Checkout {
    pub fn new(backend: SharedBackend, session: Arc<Session>) -> Self {
        Self { backend, session }
    }

    /// The first saved address, preselected on the checkout page.
    pub async fn default_address(&self) -> Result<Option<Address>, CheckoutError> {
        let addresses = self.backend.list_addresses().await?;
        Ok(addresses.into_iter().next())
    }

    /// Places an order for `lines`.
    ///
    /// Purchased lines leave the server cart, so the session's cart count is
    /// refreshed afterwards; callers holding a [`CartReconciler`] should
    /// reload it.
    ///
    /// [`CartReconciler`]: crate::cart::CartReconciler
    #[instrument(skip(self, lines, note), fields(lines = lines.len()))]
    pub async fn place_order(
        &self,
        lines: &[CartLine],
        address_id: Option<AddressId>,
        note: impl Into<String>,
    ) -> Result<Order, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptySelection);
        }
        let address_id = address_id.ok_or(CheckoutError::MissingAddress)?;

        let order = self
            .backend
            .place_order(PlaceOrder {
                address_id,
                cart_item_ids: lines.iter().map(|line| line.id).collect(),
                customer_note: note.into(),
            })
            .await?;
        info!(order_id = %order.id(), total = order.total_amount(), "Order placed");

        self.session.refresh_cart_count(self.backend.as_ref()).await;
        Ok(order)
    }
}
