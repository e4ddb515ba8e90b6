//! # Sandbox Backend
//!
//! An in-process stand-in for the storefront server, built as an actor. It owns
//! the catalog, a single user's cart, saved addresses and orders, and answers
//! [`BackendRequest`]s one at a time. Because every request is processed
//! sequentially inside one task, no locks are needed for its state.
//!
//! The sandbox enforces the same rules the real backend does:
//!
//! - cart quantities must stay within `1..=stock` at the moment of the request;
//! - placing an order snapshots prices, decrements stock and removes the
//!   purchased lines from the cart;
//! - customers may only cancel `PENDING` orders; cancelling restocks;
//! - admin transitions follow [`OrderStatus::successors`];
//! - a product may be reviewed (rating `1..=5`) only once an order containing
//!   it was delivered.
//!
//! Out-of-band changes (another buyer draining stock, an admin edit) go
//! through a [`SandboxHandle`].
//!
//! ```rust
//! use storefront_core::{SandboxBackend, StorefrontBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sandbox, backend, handle) = SandboxBackend::new(32);
//!     tokio::spawn(sandbox.run());
//!
//!     let chair = handle.seed_product("Ghế gỗ", 250.0, 4).await.unwrap();
//!     let product = backend.get_product(chair).await.unwrap();
//!     assert_eq!(product.stock_quantity, 4);
//! }
//! ```

use crate::client::ChannelBackend;
use crate::error::ApiError;
use crate::message::BackendRequest;
use crate::model::{
    Actor, AddToCart, Address, AddressId, Cart, CartItemId, CartLine, NewReview, Order, OrderId,
    OrderItem, OrderQuery, OrderStatus, Page, PlaceOrder, Product, ProductId, Review, ReviewId,
    StatusUpdate, RATING_RANGE,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Author name the sandbox puts on reviews.
pub const SANDBOX_USERNAME: &str = "khachhang";

/// Out-of-band commands that bypass the REST surface.
#[derive(Debug)]
pub enum SandboxCommand {
    SeedProduct {
        name: String,
        price: f64,
        stock: u32,
        respond_to: oneshot::Sender<ProductId>,
    },
    SeedAddress {
        city: String,
        commune: String,
        village: String,
        respond_to: oneshot::Sender<AddressId>,
    },
    SetStock {
        id: ProductId,
        stock: u32,
        respond_to: oneshot::Sender<Result<(), ApiError>>,
    },
}

/// Handle for seeding the sandbox and mutating it behind the client's back.
#[derive(Debug, Clone)]
pub struct SandboxHandle {
    sender: mpsc::Sender<SandboxCommand>,
}

impl SandboxHandle {
    pub async fn seed_product(
        &self,
        name: impl Into<String>,
        price: f64,
        stock: u32,
    ) -> Result<ProductId, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SandboxCommand::SeedProduct {
                name: name.into(),
                price,
                stock,
                respond_to,
            })
            .await
            .map_err(|_| ApiError::BackendClosed)?;
        response.await.map_err(|_| ApiError::BackendDropped)
    }

    pub async fn seed_address(
        &self,
        city: impl Into<String>,
        commune: impl Into<String>,
        village: impl Into<String>,
    ) -> Result<AddressId, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SandboxCommand::SeedAddress {
                city: city.into(),
                commune: commune.into(),
                village: village.into(),
                respond_to,
            })
            .await
            .map_err(|_| ApiError::BackendClosed)?;
        response.await.map_err(|_| ApiError::BackendDropped)
    }

    /// Overwrites a product's stock, as another buyer or an admin would.
    pub async fn set_stock(&self, id: ProductId, stock: u32) -> Result<(), ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(SandboxCommand::SetStock {
                id,
                stock,
                respond_to,
            })
            .await
            .map_err(|_| ApiError::BackendClosed)?;
        response.await.map_err(|_| ApiError::BackendDropped)?
    }
}

/// The sandbox actor. Create with [`SandboxBackend::new`], then spawn
/// [`run`](SandboxBackend::run).
pub struct SandboxBackend {
    requests: mpsc::Receiver<BackendRequest>,
    commands: mpsc::Receiver<SandboxCommand>,
    store: SandboxStore,
}

#[derive(Default)]
struct SandboxStore {
    products: HashMap<ProductId, Product>,
    cart: Vec<(CartItemId, ProductId, u32)>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
    reviews: Vec<(ProductId, Review)>,
    next_id: u64,
}

impl SandboxBackend {
    /// Creates the actor, the client that talks to it, and its seeding handle.
    ///
    /// The actor stops once every clone of the returned [`ChannelBackend`] is
    /// dropped; outstanding [`SandboxHandle`]s do not keep it alive.
    pub fn new(buffer_size: usize) -> (Self, ChannelBackend, SandboxHandle) {
        let (backend, requests) = ChannelBackend::channel(buffer_size);
        let (command_sender, commands) = mpsc::channel(buffer_size);
        let actor = Self {
            requests,
            commands,
            store: SandboxStore::default(),
        };
        (
            actor,
            backend,
            SandboxHandle {
                sender: command_sender,
            },
        )
    }

    /// Runs the actor's event loop until the request channel closes.
    pub async fn run(mut self) {
        info!("Sandbox backend started");
        loop {
            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(request) => self.store.handle(request),
                    None => break,
                },
                Some(command) = self.commands.recv() => self.store.apply(command),
            }
        }
        info!(
            products = self.store.products.len(),
            orders = self.store.orders.len(),
            "Sandbox backend shutdown"
        );
    }
}

impl SandboxStore {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn apply(&mut self, command: SandboxCommand) {
        match command {
            SandboxCommand::SeedProduct {
                name,
                price,
                stock,
                respond_to,
            } => {
                let id = ProductId(self.next_id());
                self.products
                    .insert(id, Product::new(id, name, price, stock));
                debug!(product_id = %id, stock, "Seeded product");
                let _ = respond_to.send(id);
            }
            SandboxCommand::SeedAddress {
                city,
                commune,
                village,
                respond_to,
            } => {
                let id = AddressId(self.next_id());
                self.addresses.push(Address {
                    id,
                    city,
                    commune,
                    village,
                    note: None,
                });
                let _ = respond_to.send(id);
            }
            SandboxCommand::SetStock {
                id,
                stock,
                respond_to,
            } => {
                let result = match self.products.get_mut(&id) {
                    Some(product) => {
                        info!(product_id = %id, from = product.stock_quantity, to = stock, "Stock changed out of band");
                        product.stock_quantity = stock;
                        Ok(())
                    }
                    None => Err(ApiError::not_found(format!("Product not found: {id}"))),
                };
                let _ = respond_to.send(result);
            }
        }
    }

    fn handle(&mut self, request: BackendRequest) {
        let route = request.route();
        debug!(%route, "Request");
        match request {
            BackendRequest::GetProduct { id, respond_to } => {
                let _ = respond_to.send(self.product(id).cloned());
            }
            BackendRequest::GetCart { respond_to } => {
                let _ = respond_to.send(Ok(self.cart()));
            }
            BackendRequest::AddToCart { item, respond_to } => {
                let result = self.add_to_cart(item);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result);
            }
            BackendRequest::UpdateCartItem {
                id,
                quantity,
                respond_to,
            } => {
                let result = self.update_cart_item(id, quantity);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result);
            }
            BackendRequest::RemoveCartItem { id, respond_to } => {
                let result = self.remove_cart_item(id);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result);
            }
            BackendRequest::ClearCart { respond_to } => {
                self.cart.clear();
                let _ = respond_to.send(Ok(self.cart()));
            }
            BackendRequest::ListAddresses { respond_to } => {
                let _ = respond_to.send(Ok(self.addresses.clone()));
            }
            BackendRequest::PlaceOrder { order, respond_to } => {
                let result = self.place_order(order);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result);
            }
            BackendRequest::ListOrders { respond_to } => {
                let mut orders = self.orders.clone();
                newest_first(&mut orders);
                let _ = respond_to.send(Ok(orders));
            }
            BackendRequest::CancelOrder { id, respond_to } => {
                let result = self.transition(id, OrderStatus::Cancelled, Actor::Customer);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result.map(|_| ()));
            }
            BackendRequest::AdminListOrders { query, respond_to } => {
                let _ = respond_to.send(Ok(self.admin_list(query)));
            }
            BackendRequest::AdminUpdateStatus {
                id,
                update: StatusUpdate { new_status },
                respond_to,
            } => {
                let result = self.transition(id, new_status, Actor::Admin);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result);
            }
            BackendRequest::ListReviews {
                product_id,
                respond_to,
            } => {
                let result = self.product(product_id).map(|_| {
                    self.reviews
                        .iter()
                        .filter(|(reviewed, _)| *reviewed == product_id)
                        .map(|(_, review)| review.clone())
                        .collect()
                });
                let _ = respond_to.send(result);
            }
            BackendRequest::CreateReview { review, respond_to } => {
                let result = self.create_review(review);
                Self::log_outcome(&route, &result);
                let _ = respond_to.send(result);
            }
        }
    }

    fn log_outcome<T>(route: &str, result: &Result<T, ApiError>) {
        match result {
            Ok(_) => info!(%route, "Accepted"),
            Err(e) => warn!(%route, error = %e, "Rejected"),
        }
    }

    fn product(&self, id: ProductId) -> Result<&Product, ApiError> {
        self.products
            .get(&id)
            .ok_or_else(|| ApiError::not_found(format!("Product not found: {id}")))
    }

    fn check_stock(&self, id: ProductId, requested: u32) -> Result<(), ApiError> {
        if requested == 0 {
            return Err(ApiError::bad_request("Quantity must be at least 1"));
        }
        let available = self.product(id)?.stock_quantity;
        if requested > available {
            return Err(ApiError::bad_request(format!(
                "Insufficient stock: requested {requested}, available {available}"
            )));
        }
        Ok(())
    }

    fn cart(&self) -> Cart {
        let lines = self
            .cart
            .iter()
            .filter_map(|(line_id, product_id, quantity)| {
                let product = self.products.get(product_id)?.clone();
                Some(CartLine::new(*line_id, product, *quantity))
            })
            .collect();
        Cart::from_lines(lines)
    }

    fn add_to_cart(&mut self, item: AddToCart) -> Result<Cart, ApiError> {
        let existing = self
            .cart
            .iter()
            .position(|(_, product_id, _)| *product_id == item.product_id);
        let already = existing.map_or(0, |index| self.cart[index].2);
        let total = already.checked_add(item.quantity).ok_or_else(|| {
            ApiError::bad_request(format!("Quantity out of range: {already} + {}", item.quantity))
        })?;
        self.check_stock(item.product_id, total)?;
        match existing {
            Some(index) => self.cart[index].2 = total,
            None => {
                let line_id = CartItemId(self.next_id());
                self.cart.push((line_id, item.product_id, item.quantity));
            }
        }
        Ok(self.cart())
    }

    fn update_cart_item(&mut self, id: CartItemId, quantity: u32) -> Result<Cart, ApiError> {
        let index = self.line_index(id)?;
        self.check_stock(self.cart[index].1, quantity)?;
        self.cart[index].2 = quantity;
        Ok(self.cart())
    }

    fn remove_cart_item(&mut self, id: CartItemId) -> Result<Cart, ApiError> {
        let index = self.line_index(id)?;
        self.cart.remove(index);
        Ok(self.cart())
    }

    fn line_index(&self, id: CartItemId) -> Result<usize, ApiError> {
        self.cart
            .iter()
            .position(|(line_id, _, _)| *line_id == id)
            .ok_or_else(|| ApiError::not_found(format!("Cart item not found: {id}")))
    }

    fn place_order(&mut self, order: PlaceOrder) -> Result<Order, ApiError> {
        if !self.addresses.iter().any(|a| a.id == order.address_id) {
            return Err(ApiError::bad_request("Address not found"));
        }
        if order.cart_item_ids.is_empty() {
            return Err(ApiError::bad_request("No items selected"));
        }

        let mut seen = HashSet::with_capacity(order.cart_item_ids.len());
        if let Some(duplicate) = order.cart_item_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ApiError::bad_request(format!(
                "Duplicate cart item: {duplicate}"
            )));
        }

        let mut items = Vec::with_capacity(order.cart_item_ids.len());
        for line_id in &order.cart_item_ids {
            let (_, product_id, quantity) = self.cart[self.line_index(*line_id)?];
            self.check_stock(product_id, quantity)?;
            let product = self.product(product_id)?;
            items.push(OrderItem {
                product_id,
                product_name: product.name.clone(),
                quantity,
                price_at_purchase: product.price,
            });
        }

        for item in &items {
            if let Some(product) = self.products.get_mut(&item.product_id) {
                product.stock_quantity = product.stock_quantity.saturating_sub(item.quantity);
            }
        }
        self.cart
            .retain(|(line_id, _, _)| !order.cart_item_ids.contains(line_id));

        let id = OrderId(self.next_id());
        let mut placed = Order::new(
            id,
            OrderStatus::Pending,
            items,
            chrono::Utc::now().naive_utc(),
        );
        if !order.customer_note.is_empty() {
            placed = placed.with_note(order.customer_note);
        }
        self.orders.push(placed.clone());
        Ok(placed)
    }

    fn transition(
        &mut self,
        id: OrderId,
        target: OrderStatus,
        actor: Actor,
    ) -> Result<Order, ApiError> {
        let order = self
            .orders
            .iter_mut()
            .find(|order| order.id() == id)
            .ok_or_else(|| ApiError::not_found(format!("Order not found: {id}")))?;

        let current = order.status();
        if !current.can_transition(target, actor) {
            let message = match actor {
                Actor::Customer => "Only pending orders can be cancelled".to_string(),
                Actor::Admin => format!("Cannot change order status from {current} to {target}"),
            };
            return Err(ApiError::bad_request(message));
        }

        order.set_status(target);
        let updated = order.clone();
        if target == OrderStatus::Cancelled {
            for item in updated.items() {
                if let Some(product) = self.products.get_mut(&item.product_id) {
                    product.stock_quantity = product.stock_quantity.saturating_add(item.quantity);
                }
            }
        }
        Ok(updated)
    }

    fn create_review(&mut self, review: NewReview) -> Result<Review, ApiError> {
        self.product(review.product_id)?;
        if !RATING_RANGE.contains(&review.rating) {
            return Err(ApiError::bad_request(format!(
                "Rating must be between 1 and 5, got {}",
                review.rating
            )));
        }
        let delivered = self.orders.iter().any(|order| {
            order.status() == OrderStatus::Delivered
                && order
                    .items()
                    .iter()
                    .any(|item| item.product_id == review.product_id)
        });
        if !delivered {
            return Err(ApiError::rejected(
                403,
                "You can only review products from a delivered order",
            ));
        }

        let created = Review {
            id: ReviewId(self.next_id()),
            username: SANDBOX_USERNAME.to_string(),
            rating: review.rating,
            comment: review.comment,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.reviews.push((review.product_id, created.clone()));
        Ok(created)
    }

    fn admin_list(&self, query: OrderQuery) -> Page<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|order| query.status.map_or(true, |status| order.status() == status))
            .cloned()
            .collect();
        newest_first(&mut orders);

        let size = query.size.unwrap_or(20).max(1);
        let number = query.page.unwrap_or(0);
        let total_elements = orders.len() as u64;
        let total_pages = u32::try_from(orders.len().div_ceil(size as usize)).unwrap_or(u32::MAX);
        let content = orders
            .into_iter()
            .skip(number as usize * size as usize)
            .take(size as usize)
            .collect();
        Page {
            content,
            total_elements,
            total_pages,
            number,
            size,
        }
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}
