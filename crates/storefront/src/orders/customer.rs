use super::error::{cancel_failed, OrderError, CANCEL_UNKNOWN};
use crate::confirm::{ActionOutcome, Confirm};
use crate::guard::ProcessingGuard;
use crate::notices::Notices;
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use storefront_core::{Order, OrderId, SharedBackend};
use tracing::{info, instrument, warn};

pub const CANCEL_PROMPT: &str =
    "Bạn có chắc chắn muốn hủy đơn hàng này? Thao tác này không thể hoàn tác.";

/// The customer's order history with its cancel affordance.
pub struct CustomerOrders {
    backend: SharedBackend,
    orders: Mutex<Vec<Order>>,
    row_errors: Notices<OrderId>,
    cancelling: AtomicBool,
}

impl CustomerOrders {
    pub fn new(backend: SharedBackend, notice_ttl: Duration) -> Self {
        Self {
            backend,
            orders: Mutex::new(Vec::new()),
            row_errors: Notices::new(notice_ttl),
            cancelling: AtomicBool::new(false),
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Vec<Order>, OrderError> {
        let orders = self.backend.list_orders().await?;
        info!(count = orders.len(), "Orders loaded");
        *self.orders.lock().unwrap_or_else(PoisonError::into_inner) = orders.clone();
        Ok(orders)
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn find(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|order| order.id() == id)
            .cloned()
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Whether the cancel button is shown for this order.
    pub fn can_cancel(&self, id: OrderId) -> bool {
        self.find(id)
            .is_ok_and(|order| order.status().customer_can_cancel())
    }

    /// Cancels a pending order after confirmation, then reloads the list.
    ///
    /// On failure the list is left as it was and the row gets an error notice.
    #[instrument(skip(self, confirm), fields(order_id = %id))]
    pub async fn cancel(&self, id: OrderId, confirm: &dyn Confirm) -> Result<ActionOutcome, OrderError> {
        let order = self.find(id)?;
        if !order.status().customer_can_cancel() {
            return Err(OrderError::NotCancellable {
                id,
                status: order.status(),
            });
        }
        let Some(_guard) = ProcessingGuard::acquire(&self.cancelling) else {
            return Ok(ActionOutcome::Busy);
        };
        if !confirm.confirm(CANCEL_PROMPT) {
            return Ok(ActionOutcome::Declined);
        }

        match self.backend.cancel_order(id).await {
            Ok(()) => {
                info!("Order cancelled");
                self.row_errors.clear(&id);
                if let Err(e) = self.load().await {
                    warn!(error = %e, "Reload after cancel failed");
                }
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Cancel rejected");
                let message = e.backend_message().unwrap_or(CANCEL_UNKNOWN);
                self.row_errors.set(id, cancel_failed(message));
                Err(e.into())
            }
        }
    }

    pub fn row_error(&self, id: OrderId) -> Option<String> {
        self.row_errors.get(&id)
    }
}
