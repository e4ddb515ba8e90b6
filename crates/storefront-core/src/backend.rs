//! # StorefrontBackend Trait
//!
//! The REST contract the client core consumes. Each method maps to exactly one
//! request; implementations never retry.
//!
//! | method | request |
//! |--------|---------|
//! | [`get_product`](StorefrontBackend::get_product) | `GET /products/{id}` |
//! | [`get_cart`](StorefrontBackend::get_cart) | `GET /user/cart` |
//! | [`add_to_cart`](StorefrontBackend::add_to_cart) | `POST /user/cart/add` |
//! | [`update_cart_item`](StorefrontBackend::update_cart_item) | `PATCH /user/cart/items/{id}?quantity=N` |
//! | [`remove_cart_item`](StorefrontBackend::remove_cart_item) | `DELETE /user/cart/items/{id}` |
//! | [`clear_cart`](StorefrontBackend::clear_cart) | `DELETE /user/cart/clear` |
//! | [`list_addresses`](StorefrontBackend::list_addresses) | `GET /user/addresses` |
//! | [`place_order`](StorefrontBackend::place_order) | `POST /user/orders` |
//! | [`list_orders`](StorefrontBackend::list_orders) | `GET /user/orders` |
//! | [`cancel_order`](StorefrontBackend::cancel_order) | `PATCH /user/orders/{id}/cancel` |
//! | [`admin_list_orders`](StorefrontBackend::admin_list_orders) | `GET /admin/orders` |
//! | [`admin_update_status`](StorefrontBackend::admin_update_status) | `PATCH /admin/orders/{id}/status` |
//! | [`list_reviews`](StorefrontBackend::list_reviews) | `GET /reviews/product/{id}` |
//! | [`create_review`](StorefrontBackend::create_review) | `POST /reviews` |

use crate::error::ApiError;
use crate::model::{
    AddToCart, Address, Cart, CartItemId, NewReview, Order, OrderId, OrderQuery, Page, PlaceOrder,
    Product, ProductId, Review, StatusUpdate,
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait StorefrontBackend: Send + Sync {
    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError>;

    async fn get_cart(&self) -> Result<Cart, ApiError>;

    async fn add_to_cart(&self, item: AddToCart) -> Result<Cart, ApiError>;

    async fn update_cart_item(&self, id: CartItemId, quantity: u32) -> Result<Cart, ApiError>;

    async fn remove_cart_item(&self, id: CartItemId) -> Result<Cart, ApiError>;

    async fn clear_cart(&self) -> Result<Cart, ApiError>;

    async fn list_addresses(&self) -> Result<Vec<Address>, ApiError>;

    async fn place_order(&self, order: PlaceOrder) -> Result<Order, ApiError>;

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;

    /// The backend may answer with the updated order or an empty body; either
    /// way the caller re-reads the list.
    async fn cancel_order(&self, id: OrderId) -> Result<(), ApiError>;

    async fn admin_list_orders(&self, query: OrderQuery) -> Result<Page<Order>, ApiError>;

    async fn admin_update_status(
        &self,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<Order, ApiError>;

    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError>;

    /// Answers `403` when the user has no delivered order for the product.
    async fn create_review(&self, review: NewReview) -> Result<Review, ApiError>;
}

/// Backend handle shared by every component of one storefront.
pub type SharedBackend = Arc<dyn StorefrontBackend>;
