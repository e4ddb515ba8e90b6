//! Admin order table and status-change dialog.

use super::error::{update_failed, OrderError};
use crate::confirm::{ActionOutcome, Confirm};
use crate::guard::ProcessingGuard;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use storefront_core::{Order, OrderId, OrderQuery, OrderStatus, Page, SharedBackend, StatusUpdate};
use tracing::{info, instrument, warn};

pub fn status_prompt(target: OrderStatus) -> String {
    format!("Bạn có chắc muốn chuyển trạng thái sang {target}?")
}

#[derive(Debug, Default)]
struct AdminState {
    query: OrderQuery,
    page: Option<Page<Order>>,
    detail: Option<Order>,
    detail_error: Option<String>,
}

pub struct AdminOrders {
    backend: SharedBackend,
    state: Mutex<AdminState>,
    updating: AtomicBool,
}

impl AdminOrders {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            state: Mutex::new(AdminState::default()),
            updating: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, AdminState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads one page of orders, newest first, and remembers the filters for
    /// later reloads.
    #[instrument(skip(self))]
    pub async fn load(&self, query: OrderQuery) -> Result<Page<Order>, OrderError> {
        let mut page = self.backend.admin_list_orders(query).await?;
        page.content
            .sort_by_key(|order| std::cmp::Reverse(order.created_at()));
        info!(count = page.content.len(), total = page.total_elements, "Admin orders loaded");

        let mut state = self.state();
        state.query = query;
        state.page = Some(page.clone());
        Ok(page)
    }

    pub async fn reload(&self) -> Result<Page<Order>, OrderError> {
        let query = self.state().query;
        self.load(query).await
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state()
            .page
            .as_ref()
            .map(|page| page.content.clone())
            .unwrap_or_default()
    }

    pub fn page(&self) -> Option<Page<Order>> {
        self.state().page.clone()
    }

    /// Opens the detail dialog for an order in the current page.
    pub fn open_detail(&self, id: OrderId) -> Result<Order, OrderError> {
        let mut state = self.state();
        let order = state
            .page
            .as_ref()
            .and_then(|page| page.content.iter().find(|order| order.id() == id))
            .cloned()
            .ok_or(OrderError::OrderNotFound(id))?;
        state.detail = Some(order.clone());
        state.detail_error = None;
        Ok(order)
    }

    pub fn close_detail(&self) {
        let mut state = self.state();
        state.detail = None;
        state.detail_error = None;
    }

    pub fn detail(&self) -> Option<Order> {
        self.state().detail.clone()
    }

    /// The last failed status change, shown in the open dialog.
    pub fn detail_error(&self) -> Option<String> {
        self.state().detail_error.clone()
    }

    /// Targets offered for the open order. Terminal orders get none.
    pub fn status_options(&self) -> Vec<OrderStatus> {
        self.state()
            .detail
            .as_ref()
            .map(|order| order.status().admin_options())
            .unwrap_or_default()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Moves the open order to `target` after confirmation.
    ///
    /// Success closes the dialog and reloads the table. Failure keeps the
    /// dialog open with the prior status and records the error verbatim.
    #[instrument(skip(self, confirm))]
    pub async fn change_status(
        &self,
        target: OrderStatus,
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome, OrderError> {
        let order = self.detail().ok_or(OrderError::NoOrderSelected)?;
        let current = order.status();
        if current.is_terminal() {
            return Err(OrderError::TerminalOrder(current));
        }
        if current == target {
            return Err(OrderError::SameStatus(current));
        }
        let Some(_guard) = ProcessingGuard::acquire(&self.updating) else {
            return Ok(ActionOutcome::Busy);
        };
        if !confirm.confirm(&status_prompt(target)) {
            return Ok(ActionOutcome::Declined);
        }

        let update = StatusUpdate { new_status: target };
        match self.backend.admin_update_status(order.id(), update).await {
            Ok(updated) => {
                info!(order_id = %updated.id(), from = %current, to = %updated.status(), "Order status changed");
                self.close_detail();
                if let Err(e) = self.reload().await {
                    warn!(error = %e, "Reload after status change failed");
                }
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                warn!(order_id = %order.id(), error = %e, "Status change rejected");
                self.state().detail_error = Some(update_failed(&e.to_string()));
                Err(e.into())
            }
        }
    }
}
