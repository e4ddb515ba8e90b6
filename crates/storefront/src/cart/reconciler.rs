//! # Cart Reconciler
//!
//! Keeps the client's view of the cart consistent with a server whose stock
//! changes underneath it. The rules:
//!
//! 1. **Validate against the freshest stock.** Increases and typed commits
//!    re-read `GET /products/{id}` first; if that read fails the last known
//!    stock is used instead.
//! 2. **One mutation in flight.** A single processing flag guards every
//!    mutating operation; a second request while it is held is a no-op that
//!    returns [`QuantityOutcome::Busy`] / [`ActionOutcome::Busy`]. The flag is
//!    taken *before* the stock re-read, so a double click during the read is
//!    ignored too.
//! 3. **Pessimistic updates.** The local cart is never patched. Each
//!    successful mutation returns the server's cart and that replaces ours
//!    wholesale.
//! 4. **Scoped failures.** Errors become notices on the line they concern
//!    (or on the cart, for clear-cart) and expire on their own.
//!
//! ```text
//! increase(line) ──► acquire flag ──► GET /products/{id} ──► qty < stock?
//!                        │ held                                 │ no: notice "Chỉ còn N ..."
//!                        ▼                                      ▼ yes
//!                      Busy                    PATCH /user/cart/items/{id}?quantity=qty+1
//!                                                               │
//!                                              replace cart, sync badge, release flag
//! ```

use super::error::{stock_notice, CartError, CLEAR_FAILED, REMOVE_FAILED, UPDATE_FAILED};
use super::selection::Selection;
use super::stock::StockSnapshot;
use crate::checkout::CheckoutError;
use crate::confirm::{ActionOutcome, Confirm};
use crate::guard::ProcessingGuard;
use crate::notices::Notices;
use std::collections::{HashMap, HashSet};
use std::num::IntErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use storefront_core::{
    AddToCart, Cart, CartItemId, CartLine, ProductId, Session, SharedBackend,
};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

pub const REMOVE_PROMPT: &str = "Bạn chắc chắn muốn xóa sản phẩm này?";
pub const CLEAR_PROMPT: &str = "Bạn có chắc muốn xóa toàn bộ giỏ hàng?";

/// Where a notice is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeScope {
    Line(CartItemId),
    Cart,
}

/// A requested quantity edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Increase,
    Decrease,
    /// An absolute value, handled like a typed commit.
    Set(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// The backend accepted the new quantity.
    Committed(u32),
    /// Nothing to send: the quantity would not change.
    Unchanged,
    /// The typed value was unusable; the input shows the committed quantity again.
    Reverted,
    /// Another mutation was in flight.
    Busy,
}

#[derive(Debug, Default)]
struct CartState {
    cart: Option<Cart>,
    drafts: HashMap<CartItemId, String>,
    selection: Selection,
    stock: StockSnapshot,
}

/// Client-side cart controller. All operations take `&self`, so concurrent
/// UI handlers can share one reconciler (typically behind an `Arc`).
pub struct CartReconciler {
    backend: SharedBackend,
    session: Arc<Session>,
    state: Mutex<CartState>,
    notices: Notices<NoticeScope>,
    processing: AtomicBool,
}

impl CartReconciler {
    pub fn new(backend: SharedBackend, session: Arc<Session>, notice_ttl: Duration) -> Self {
        Self {
            backend,
            session,
            state: Mutex::new(CartState::default()),
            notices: Notices::new(notice_ttl),
            processing: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Fetches the cart, replaces local state and refreshes the stock of every
    /// line concurrently.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Cart, CartError> {
        let cart = self.backend.get_cart().await?;
        {
            let mut state = self.state();
            state.drafts.clear();
        }
        self.apply(cart.clone());
        self.refresh_stock(&cart).await;
        info!(lines = cart.items.len(), units = cart.item_count(), "Cart loaded");
        Ok(cart)
    }

    async fn refresh_stock(&self, cart: &Cart) {
        let products: HashSet<ProductId> = cart.items.iter().map(CartLine::product_id).collect();
        let mut fetches = JoinSet::new();
        for product_id in products {
            let backend = self.backend.clone();
            fetches.spawn(async move { (product_id, backend.get_product(product_id).await) });
        }

        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((product_id, Ok(product))) => {
                    self.state().stock.record(product_id, product.stock_quantity);
                }
                Ok((product_id, Err(e))) => {
                    warn!(%product_id, error = %e, "Stock refresh failed; keeping embedded stock");
                }
                Err(e) => warn!(error = %e, "Stock refresh task failed"),
            }
        }
    }

    /// Replaces the cart with the server's answer.
    fn apply(&self, cart: Cart) {
        {
            let mut state = self.state();
            state.drafts.retain(|id, _| cart.contains(*id));
            state.selection.retain_present(&cart);
            for line in &cart.items {
                state
                    .stock
                    .record(line.product_id(), line.product.stock_quantity);
            }
            state.cart = Some(cart.clone());
        }
        self.notices.retain(|scope| match scope {
            NoticeScope::Line(id) => cart.contains(*id),
            NoticeScope::Cart => true,
        });
        self.session.sync_cart_count(&cart);
    }

    fn line(&self, id: CartItemId) -> Result<CartLine, CartError> {
        let state = self.state();
        let cart = state.cart.as_ref().ok_or(CartError::NotLoaded)?;
        cart.line(id).cloned().ok_or(CartError::LineNotFound(id))
    }

    /// Re-reads a line's stock, falling back to the snapshot on failure.
    async fn fresh_stock(&self, line: &CartLine) -> u32 {
        match self.backend.get_product(line.product_id()).await {
            Ok(product) => {
                debug!(product_id = %product.id, stock = product.stock_quantity, "Fresh stock");
                self.state()
                    .stock
                    .record(line.product_id(), product.stock_quantity);
                product.stock_quantity
            }
            Err(e) => {
                let known = self.state().stock.for_line(line);
                warn!(product_id = %line.product_id(), error = %e, known, "Stock re-read failed; using last known");
                known
            }
        }
    }

    fn notify_stock(&self, id: CartItemId, available: u32) {
        self.notices
            .set(NoticeScope::Line(id), stock_notice(available));
    }

    fn restore_draft(&self, id: CartItemId) {
        self.state().drafts.remove(&id);
    }

    // =========================================================================
    // QUANTITY EDITS
    // =========================================================================

    pub async fn increase(&self, id: CartItemId) -> Result<QuantityOutcome, CartError> {
        self.request_quantity_change(id, QuantityChange::Increase)
            .await
    }

    pub async fn decrease(&self, id: CartItemId) -> Result<QuantityOutcome, CartError> {
        self.request_quantity_change(id, QuantityChange::Decrease)
            .await
    }

    /// Validates and commits one quantity change for a line.
    ///
    /// At most one `PATCH` is sent. Exceeding fresh stock yields
    /// [`CartError::StockExceeded`] and a line notice; a failed `PATCH` leaves
    /// the committed quantity untouched and sets a line notice.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn request_quantity_change(
        &self,
        id: CartItemId,
        change: QuantityChange,
    ) -> Result<QuantityOutcome, CartError> {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            debug!("Ignored: another cart mutation is in flight");
            return Ok(QuantityOutcome::Busy);
        };
        let line = self.line(id)?;

        match change {
            QuantityChange::Increase => {
                let stock = self.fresh_stock(&line).await;
                if line.quantity >= stock {
                    info!(quantity = line.quantity, stock, "Increase refused by stock");
                    self.notify_stock(id, stock);
                    return Err(CartError::StockExceeded {
                        product_id: line.product_id(),
                        available: stock,
                    });
                }
                self.commit(&line, line.quantity + 1, false).await
            }
            QuantityChange::Decrease => {
                if line.quantity <= 1 {
                    return Ok(QuantityOutcome::Unchanged);
                }
                let mut target = line.quantity - 1;
                let known = self.state().stock.for_line(&line);
                let clamped = known >= 1 && target > known;
                if clamped {
                    target = known;
                    self.notify_stock(id, known);
                }
                self.commit(&line, target, clamped).await
            }
            QuantityChange::Set(0) => {
                self.restore_draft(id);
                Ok(QuantityOutcome::Reverted)
            }
            QuantityChange::Set(requested) => self.commit_absolute(&line, requested).await,
        }
    }

    /// Stores the text of a line's quantity field. Non-digits are dropped;
    /// nothing is sent.
    pub fn edit_input(&self, id: CartItemId, raw: &str) -> Result<String, CartError> {
        let sanitized: String = raw.chars().filter(char::is_ascii_digit).collect();
        {
            let mut state = self.state();
            let cart = state.cart.as_ref().ok_or(CartError::NotLoaded)?;
            if !cart.contains(id) {
                return Err(CartError::LineNotFound(id));
            }
            state.drafts.insert(id, sanitized.clone());
        }
        self.notices.clear(&NoticeScope::Line(id));
        Ok(sanitized)
    }

    /// Commits the typed value of a line (blur or enter).
    ///
    /// An empty, zero or unparsable value silently restores the committed
    /// quantity without any request.
    #[instrument(skip(self), fields(line_id = %id))]
    pub async fn commit_input(&self, id: CartItemId) -> Result<QuantityOutcome, CartError> {
        let line = self.line(id)?;
        let draft = self.state().drafts.get(&id).cloned();
        let Some(requested) = draft.as_deref().map_or(Some(line.quantity), parse_quantity) else {
            debug!(?draft, "Reverting unusable input");
            self.restore_draft(id);
            return Ok(QuantityOutcome::Reverted);
        };

        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            debug!("Ignored: another cart mutation is in flight");
            return Ok(QuantityOutcome::Busy);
        };
        self.commit_absolute(&line, requested).await
    }

    async fn commit_absolute(
        &self,
        line: &CartLine,
        requested: u32,
    ) -> Result<QuantityOutcome, CartError> {
        let stock = self.fresh_stock(line).await;
        if stock == 0 {
            self.notify_stock(line.id, 0);
            self.restore_draft(line.id);
            return Err(CartError::StockExceeded {
                product_id: line.product_id(),
                available: 0,
            });
        }

        let target = requested.min(stock);
        let clamped = target < requested;
        if clamped {
            info!(requested, stock, "Typed quantity clamped to stock");
            self.notify_stock(line.id, stock);
        }
        if target == line.quantity {
            self.restore_draft(line.id);
            return Ok(QuantityOutcome::Unchanged);
        }
        self.commit(line, target, clamped).await
    }

    async fn commit(
        &self,
        line: &CartLine,
        quantity: u32,
        keep_notice: bool,
    ) -> Result<QuantityOutcome, CartError> {
        match self.backend.update_cart_item(line.id, quantity).await {
            Ok(cart) => {
                info!(line_id = %line.id, from = line.quantity, to = quantity, "Quantity committed");
                self.restore_draft(line.id);
                if !keep_notice {
                    self.notices.clear(&NoticeScope::Line(line.id));
                }
                self.apply(cart);
                Ok(QuantityOutcome::Committed(quantity))
            }
            Err(e) => {
                warn!(line_id = %line.id, quantity, error = %e, "Quantity update failed");
                let message = e
                    .backend_message()
                    .map_or_else(|| UPDATE_FAILED.to_string(), str::to_string);
                self.notices.set(NoticeScope::Line(line.id), message);
                self.restore_draft(line.id);
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // ADD / REMOVE / CLEAR
    // =========================================================================

    /// Adds units of a product, as the product page does.
    ///
    /// The quantity already in the cart counts against fresh stock.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_product(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ActionOutcome, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            return Ok(ActionOutcome::Busy);
        };

        let stock = match self.backend.get_product(product_id).await {
            Ok(product) => {
                self.state().stock.record(product_id, product.stock_quantity);
                product.stock_quantity
            }
            Err(e) => {
                let known = self.state().stock.get(product_id);
                match known {
                    Some(known) => {
                        warn!(error = %e, known, "Stock re-read failed; using last known");
                        known
                    }
                    None => return Err(e.into()),
                }
            }
        };

        let in_cart = self
            .state()
            .cart
            .as_ref()
            .and_then(|cart| cart.line_for_product(product_id))
            .map_or(0, |line| line.quantity);
        if in_cart.checked_add(quantity).map_or(true, |total| total > stock) {
            info!(in_cart, quantity, stock, "Add refused by stock");
            return Err(CartError::StockExceeded {
                product_id,
                available: stock,
            });
        }

        let cart = self
            .backend
            .add_to_cart(AddToCart {
                product_id,
                quantity,
            })
            .await?;
        info!(quantity, "Added to cart");
        self.apply(cart);
        Ok(ActionOutcome::Applied)
    }

    /// Removes a line after explicit confirmation.
    #[instrument(skip(self, confirm), fields(line_id = %id))]
    pub async fn remove_line(
        &self,
        id: CartItemId,
        confirm: &dyn Confirm,
    ) -> Result<ActionOutcome, CartError> {
        self.line(id)?;
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            return Ok(ActionOutcome::Busy);
        };
        if !confirm.confirm(REMOVE_PROMPT) {
            return Ok(ActionOutcome::Declined);
        }

        match self.backend.remove_cart_item(id).await {
            Ok(cart) => {
                info!("Line removed");
                self.apply(cart);
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Line removal failed");
                self.notices.set(NoticeScope::Line(id), REMOVE_FAILED);
                Err(e.into())
            }
        }
    }

    /// Empties the cart after explicit confirmation.
    #[instrument(skip(self, confirm))]
    pub async fn clear_cart(&self, confirm: &dyn Confirm) -> Result<ActionOutcome, CartError> {
        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            return Ok(ActionOutcome::Busy);
        };
        if !confirm.confirm(CLEAR_PROMPT) {
            return Ok(ActionOutcome::Declined);
        }

        match self.backend.clear_cart().await {
            Ok(cart) => {
                info!("Cart cleared");
                self.notices.clear(&NoticeScope::Cart);
                self.apply(cart);
                Ok(ActionOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "Clearing the cart failed");
                self.notices.set(NoticeScope::Cart, CLEAR_FAILED);
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    pub fn toggle_selection(&self, id: CartItemId) -> bool {
        self.state().selection.toggle(id)
    }

    pub fn select_all(&self, checked: bool) {
        let mut state = self.state();
        let CartState {
            cart, selection, ..
        } = &mut *state;
        if let Some(cart) = cart {
            selection.select_all(cart, checked);
        }
    }

    pub fn is_selected(&self, id: CartItemId) -> bool {
        self.state().selection.is_selected(id)
    }

    pub fn all_selected(&self) -> bool {
        let state = self.state();
        state
            .cart
            .as_ref()
            .is_some_and(|cart| state.selection.all_selected(cart))
    }

    pub fn selected_total(&self) -> f64 {
        let state = self.state();
        state
            .cart
            .as_ref()
            .map_or(0.0, |cart| state.selection.selected_total(cart))
    }

    /// The selected lines, in cart order. Blocks checkout when empty.
    pub fn checkout_lines(&self) -> Result<Vec<CartLine>, CheckoutError> {
        let state = self.state();
        let lines: Vec<CartLine> = state
            .cart
            .as_ref()
            .map(|cart| {
                state
                    .selection
                    .selected_lines(cart)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if lines.is_empty() {
            return Err(CheckoutError::EmptySelection);
        }
        Ok(lines)
    }

    // =========================================================================
    // VIEW
    // =========================================================================

    pub fn cart(&self) -> Option<Cart> {
        self.state().cart.clone()
    }

    /// Text of a line's quantity field: the draft being typed, else the
    /// committed quantity.
    pub fn draft(&self, id: CartItemId) -> Option<String> {
        let state = self.state();
        if let Some(draft) = state.drafts.get(&id) {
            return Some(draft.clone());
        }
        state
            .cart
            .as_ref()
            .and_then(|cart| cart.line(id))
            .map(|line| line.quantity.to_string())
    }

    pub fn notice(&self, id: CartItemId) -> Option<String> {
        self.notices.get(&NoticeScope::Line(id))
    }

    pub fn cart_notice(&self) -> Option<String> {
        self.notices.get(&NoticeScope::Cart)
    }

    pub fn known_stock(&self, product_id: ProductId) -> Option<u32> {
        self.state().stock.get(product_id)
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }
}

/// Parses a digits-only draft. Empty or zero is unusable; overflow saturates.
fn parse_quantity(draft: &str) -> Option<u32> {
    let value = match draft.parse::<u32>() {
        Ok(value) => value,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u32::MAX,
        Err(_) => return None,
    };
    (value >= 1).then_some(value)
}
