//! # Mock Backend & Testing Guide
//!
//! [`MockBackend`] serves the same [`ChannelBackend`] API as the sandbox but
//! answers from a queue of scripted expectations. It is the fastest way to
//! drive the cart and order controllers into states that are awkward to reach
//! against a stateful backend: a stock re-fetch that fails, a rejection with a
//! specific message, a `401` in the middle of a flow.
//!
//! ## When to use Mocks vs the Sandbox
//!
//! | Feature | MockBackend | SandboxBackend |
//! |---------|-------------|----------------|
//! | **State** | None (scripted answers) | Real catalog, cart and orders |
//! | **Error Injection** | Easy (`return_err`) | Only the rules it enforces |
//! | **Request Log** | [`MockBackend::routes`] | Tracing only |
//! | **Use Case** | Controller edge cases | End-to-end flows |
//!
//! ## Fluent expectations
//!
//! ```rust
//! use storefront_core::mock::MockBackend;
//! use storefront_core::{ApiError, Product, ProductId, StorefrontBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockBackend::new();
//!     mock.expect_get_product(ProductId(1))
//!         .return_ok(Product::new(ProductId(1), "Sofa", 900.0, 3));
//!     mock.expect_get_product(ProductId(1))
//!         .return_err(ApiError::Transport("connection reset".into()));
//!
//!     let backend = mock.backend();
//!     assert_eq!(backend.get_product(ProductId(1)).await.unwrap().stock_quantity, 3);
//!     assert!(backend.get_product(ProductId(1)).await.is_err());
//!
//!     mock.verify();
//! }
//! ```
//!
//! ## Manual responders
//!
//! When a test needs to hold a request in flight (to observe the processing
//! guard, for example) use [`create_mock_backend`] and answer each request by
//! hand with the helpers below.

use crate::client::ChannelBackend;
use crate::error::ApiError;
use crate::message::{BackendRequest, Response};
use crate::model::{
    Address, Cart, CartItemId, Order, OrderId, Page, Product, ProductId, Review,
};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// A scripted answer to one request.
///
/// Ids are matched when present so a test fails loudly if the controller
/// touches the wrong line or order.
enum Expectation {
    GetProduct(ProductId, Result<Product, ApiError>),
    GetCart(Result<Cart, ApiError>),
    AddToCart(Result<Cart, ApiError>),
    UpdateCartItem(CartItemId, u32, Result<Cart, ApiError>),
    RemoveCartItem(CartItemId, Result<Cart, ApiError>),
    ClearCart(Result<Cart, ApiError>),
    ListAddresses(Result<Vec<Address>, ApiError>),
    PlaceOrder(Result<Order, ApiError>),
    ListOrders(Result<Vec<Order>, ApiError>),
    CancelOrder(OrderId, Result<(), ApiError>),
    AdminListOrders(Result<Page<Order>, ApiError>),
    AdminUpdateStatus(OrderId, Result<Order, ApiError>),
    ListReviews(ProductId, Result<Vec<Review>, ApiError>),
    CreateReview(ProductId, Result<Review, ApiError>),
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    routes: Vec<String>,
    mismatches: Vec<String>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A backend answering from scripted expectations, in order.
///
/// # Example
/// ```ignore
/// let mock = MockBackend::new();
/// mock.expect_get_cart().return_ok(cart);
/// mock.expect_update_cart_item(CartItemId(7), 4).return_ok(updated);
///
/// let backend = mock.backend();
/// // Drive the controller under test...
/// mock.verify(); // Every expectation consumed, nothing unexpected arrived
/// ```
pub struct MockBackend {
    backend: ChannelBackend,
    state: Arc<Mutex<MockState>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Creates a mock with no expectations. Must be called inside a runtime.
    pub fn new() -> Self {
        let (backend, mut receiver) = ChannelBackend::channel(100);
        let state = Arc::new(Mutex::new(MockState::default()));
        let state_clone = state.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let route = request.route();
                let expectation = {
                    let mut state = lock(&state_clone);
                    state.routes.push(route.clone());
                    state.expectations.pop_front()
                };
                if let Some((route, request)) = answer(route, request, expectation) {
                    lock(&state_clone).mismatches.push(route.clone());
                    reject_unexpected(route, request);
                }
            }
        });

        Self {
            backend,
            state,
            _handle: handle,
        }
    }

    /// Returns the backend for use in tests.
    pub fn backend(&self) -> ChannelBackend {
        self.backend.clone()
    }

    /// Every request received so far, as `"METHOD /path"`.
    pub fn routes(&self) -> Vec<String> {
        lock(&self.state).routes.clone()
    }

    /// Verifies that every expectation was consumed and none was violated.
    pub fn verify(&self) {
        let state = lock(&self.state);
        if !state.mismatches.is_empty() {
            panic!("Unexpected requests: {:?}", state.mismatches);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }

    fn builder<T>(
        &self,
        wrap: impl FnOnce(Result<T, ApiError>) -> Expectation + Send + 'static,
    ) -> ExpectationBuilder<T> {
        ExpectationBuilder {
            state: self.state.clone(),
            wrap: Box::new(wrap),
            _marker: PhantomData,
        }
    }

    pub fn expect_get_product(&self, id: ProductId) -> ExpectationBuilder<Product> {
        self.builder(move |r| Expectation::GetProduct(id, r))
    }

    pub fn expect_get_cart(&self) -> ExpectationBuilder<Cart> {
        self.builder(Expectation::GetCart)
    }

    pub fn expect_add_to_cart(&self) -> ExpectationBuilder<Cart> {
        self.builder(Expectation::AddToCart)
    }

    pub fn expect_update_cart_item(&self, id: CartItemId, quantity: u32) -> ExpectationBuilder<Cart> {
        self.builder(move |r| Expectation::UpdateCartItem(id, quantity, r))
    }

    pub fn expect_remove_cart_item(&self, id: CartItemId) -> ExpectationBuilder<Cart> {
        self.builder(move |r| Expectation::RemoveCartItem(id, r))
    }

    pub fn expect_clear_cart(&self) -> ExpectationBuilder<Cart> {
        self.builder(Expectation::ClearCart)
    }

    pub fn expect_list_addresses(&self) -> ExpectationBuilder<Vec<Address>> {
        self.builder(Expectation::ListAddresses)
    }

    pub fn expect_place_order(&self) -> ExpectationBuilder<Order> {
        self.builder(Expectation::PlaceOrder)
    }

    pub fn expect_list_orders(&self) -> ExpectationBuilder<Vec<Order>> {
        self.builder(Expectation::ListOrders)
    }

    pub fn expect_cancel_order(&self, id: OrderId) -> ExpectationBuilder<()> {
        self.builder(move |r| Expectation::CancelOrder(id, r))
    }

    pub fn expect_admin_list_orders(&self) -> ExpectationBuilder<Page<Order>> {
        self.builder(Expectation::AdminListOrders)
    }

    pub fn expect_admin_update_status(&self, id: OrderId) -> ExpectationBuilder<Order> {
        self.builder(move |r| Expectation::AdminUpdateStatus(id, r))
    }

    pub fn expect_list_reviews(&self, product_id: ProductId) -> ExpectationBuilder<Vec<Review>> {
        self.builder(move |r| Expectation::ListReviews(product_id, r))
    }

    /// Matches a review posted for `product_id`, whatever its rating.
    pub fn expect_create_review(&self, product_id: ProductId) -> ExpectationBuilder<Review> {
        self.builder(move |r| Expectation::CreateReview(product_id, r))
    }
}

/// Builder for a single expectation.
pub struct ExpectationBuilder<T> {
    state: Arc<Mutex<MockState>>,
    wrap: Box<dyn FnOnce(Result<T, ApiError>) -> Expectation + Send>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: ApiError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, ApiError>) {
        let expectation = (self.wrap)(response);
        lock(&self.state).expectations.push_back(expectation);
    }
}

/// Answers `request` from `expectation`, handing the request back on mismatch.
fn answer(
    route: String,
    request: BackendRequest,
    expectation: Option<Expectation>,
) -> Option<(String, BackendRequest)> {
    use BackendRequest as R;
    use Expectation as E;

    match (request, expectation) {
        (R::GetProduct { id, respond_to }, Some(E::GetProduct(want, response))) if id == want => {
            let _ = respond_to.send(response);
        }
        (R::GetCart { respond_to }, Some(E::GetCart(response)))
        | (R::AddToCart { respond_to, .. }, Some(E::AddToCart(response)))
        | (R::ClearCart { respond_to }, Some(E::ClearCart(response))) => {
            let _ = respond_to.send(response);
        }
        (
            R::UpdateCartItem {
                id,
                quantity,
                respond_to,
            },
            Some(E::UpdateCartItem(want, want_quantity, response)),
        ) if id == want && quantity == want_quantity => {
            let _ = respond_to.send(response);
        }
        (R::RemoveCartItem { id, respond_to }, Some(E::RemoveCartItem(want, response)))
            if id == want =>
        {
            let _ = respond_to.send(response);
        }
        (R::ListAddresses { respond_to }, Some(E::ListAddresses(response))) => {
            let _ = respond_to.send(response);
        }
        (R::PlaceOrder { respond_to, .. }, Some(E::PlaceOrder(response))) => {
            let _ = respond_to.send(response);
        }
        (
            R::AdminUpdateStatus { id, respond_to, .. },
            Some(E::AdminUpdateStatus(want, response)),
        ) if id == want => {
            let _ = respond_to.send(response);
        }
        (R::ListOrders { respond_to }, Some(E::ListOrders(response))) => {
            let _ = respond_to.send(response);
        }
        (R::CancelOrder { id, respond_to }, Some(E::CancelOrder(want, response))) if id == want => {
            let _ = respond_to.send(response);
        }
        (R::AdminListOrders { respond_to, .. }, Some(E::AdminListOrders(response))) => {
            let _ = respond_to.send(response);
        }
        (
            R::ListReviews {
                product_id,
                respond_to,
            },
            Some(E::ListReviews(want, response)),
        ) if product_id == want => {
            let _ = respond_to.send(response);
        }
        (R::CreateReview { review, respond_to }, Some(E::CreateReview(want, response)))
            if review.product_id == want =>
        {
            let _ = respond_to.send(response);
        }
        (request, _) => return Some((route, request)),
    }
    None
}

fn reject_unexpected(route: String, request: BackendRequest) {
    let error = ApiError::Transport(format!("unexpected request {route}"));
    match request {
        BackendRequest::GetProduct { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::GetCart { respond_to }
        | BackendRequest::AddToCart { respond_to, .. }
        | BackendRequest::UpdateCartItem { respond_to, .. }
        | BackendRequest::RemoveCartItem { respond_to, .. }
        | BackendRequest::ClearCart { respond_to } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::ListAddresses { respond_to } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::PlaceOrder { respond_to, .. }
        | BackendRequest::AdminUpdateStatus { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::ListOrders { respond_to } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::CancelOrder { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::AdminListOrders { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::ListReviews { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
        BackendRequest::CreateReview { respond_to, .. } => {
            let _ = respond_to.send(Err(error));
        }
    }
}

// =============================================================================
// MANUAL RESPONDERS
// =============================================================================

/// Creates a backend and the receiver its requests arrive on.
///
/// Nothing answers automatically; the test pulls each request off the
/// receiver and responds (or deliberately holds the responder).
pub fn create_mock_backend(buffer_size: usize) -> (ChannelBackend, mpsc::Receiver<BackendRequest>) {
    ChannelBackend::channel(buffer_size)
}

/// Helper to verify that the next message is a product fetch.
pub async fn expect_get_product(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(ProductId, Response<Product>)> {
    match receiver.recv().await {
        Some(BackendRequest::GetProduct { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a quantity update.
pub async fn expect_update_cart_item(
    receiver: &mut mpsc::Receiver<BackendRequest>,
) -> Option<(CartItemId, u32, Response<Cart>)> {
    match receiver.recv().await {
        Some(BackendRequest::UpdateCartItem {
            id,
            quantity,
            respond_to,
        }) => Some((id, quantity, respond_to)),
        _ => None,
    }
}

/// Helper returning the next request of any kind.
pub async fn next_request(receiver: &mut mpsc::Receiver<BackendRequest>) -> Option<BackendRequest> {
    receiver.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StorefrontBackend;
    use crate::model::CartLine;

    fn cart_with(quantity: u32) -> Cart {
        Cart::from_lines(vec![CartLine::new(
            CartItemId(7),
            Product::new(ProductId(3), "Bàn trà", 100.0, 5),
            quantity,
        )])
    }

    #[tokio::test]
    async fn test_manual_responders() {
        let (backend, mut receiver) = create_mock_backend(10);

        let update = tokio::spawn(async move { backend.update_cart_item(CartItemId(7), 3).await });

        let (id, quantity, responder) = expect_update_cart_item(&mut receiver)
            .await
            .expect("Expected UpdateCartItem request");
        assert_eq!((id, quantity), (CartItemId(7), 3));
        responder.send(Ok(cart_with(3))).unwrap();

        let cart = update.await.unwrap().unwrap();
        assert_eq!(cart.item_count(), 3);
    }

    #[tokio::test]
    async fn test_expectations_answer_in_order() {
        let mock = MockBackend::new();
        mock.expect_get_cart().return_ok(cart_with(2));
        mock.expect_update_cart_item(CartItemId(7), 4)
            .return_err(ApiError::bad_request("Insufficient stock"));

        let backend = mock.backend();
        assert_eq!(backend.get_cart().await.unwrap().item_count(), 2);
        let err = backend.update_cart_item(CartItemId(7), 4).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock");

        assert_eq!(
            mock.routes(),
            vec!["GET /user/cart", "PATCH /user/cart/items/7?quantity=4"]
        );
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected requests")]
    async fn test_mismatch_is_reported() {
        let mock = MockBackend::new();
        mock.expect_update_cart_item(CartItemId(7), 4).return_ok(cart_with(4));

        let result = mock.backend().update_cart_item(CartItemId(7), 5).await;
        assert!(matches!(result, Err(ApiError::Transport(_))));

        mock.verify();
    }
}
