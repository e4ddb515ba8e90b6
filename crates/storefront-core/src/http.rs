//! REST transport over `reqwest`.

use crate::backend::StorefrontBackend;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::model::{
    AddToCart, Address, Cart, CartItemId, NewReview, Order, OrderId, OrderListing, OrderQuery,
    Page, PlaceOrder, Product, ProductId, Review, StatusUpdate,
};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Error body the backend attaches to rejections.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Talks to the real storefront backend.
///
/// Every request carries the session's bearer token when one is present. A
/// `401` clears the session before the error is returned.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: ClientConfig,
    session: Arc<Session>,
    http: Client,
}

impl HttpBackend {
    /// Create a new backend client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: ClientConfig, session: Arc<Session>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            config,
            session,
            http: builder.build()?,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    format!("request failed with status {status}")
                } else {
                    text
                }
            });
        warn!(status = status.as_u16(), %message, "Backend rejected request");
        Err(ApiError::rejected(status.as_u16(), message))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StorefrontBackend for HttpBackend {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        debug!("Fetching product");
        self.json(self.http.get(self.config.url(&format!("/products/{id}"))))
            .await
    }

    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.json(self.http.get(self.config.url("/user/cart"))).await
    }

    #[instrument(skip(self))]
    async fn add_to_cart(&self, item: AddToCart) -> Result<Cart, ApiError> {
        self.json(self.http.post(self.config.url("/user/cart/add")).json(&item))
            .await
    }

    #[instrument(skip(self), fields(line_id = %id))]
    async fn update_cart_item(&self, id: CartItemId, quantity: u32) -> Result<Cart, ApiError> {
        let request = self
            .http
            .patch(self.config.url(&format!("/user/cart/items/{id}")))
            .query(&[("quantity", quantity)]);
        self.json(request).await
    }

    #[instrument(skip(self), fields(line_id = %id))]
    async fn remove_cart_item(&self, id: CartItemId) -> Result<Cart, ApiError> {
        self.json(
            self.http
                .delete(self.config.url(&format!("/user/cart/items/{id}"))),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<Cart, ApiError> {
        self.json(self.http.delete(self.config.url("/user/cart/clear")))
            .await
    }

    #[instrument(skip(self))]
    async fn list_addresses(&self) -> Result<Vec<Address>, ApiError> {
        self.json(self.http.get(self.config.url("/user/addresses")))
            .await
    }

    #[instrument(skip(self, order), fields(lines = order.cart_item_ids.len()))]
    async fn place_order(&self, order: PlaceOrder) -> Result<Order, ApiError> {
        self.json(self.http.post(self.config.url("/user/orders")).json(&order))
            .await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.json(self.http.get(self.config.url("/user/orders"))).await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn cancel_order(&self, id: OrderId) -> Result<(), ApiError> {
        self.send(
            self.http
                .patch(self.config.url(&format!("/user/orders/{id}/cancel"))),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn admin_list_orders(&self, query: OrderQuery) -> Result<Page<Order>, ApiError> {
        let request = self
            .http
            .get(self.config.url("/admin/orders"))
            .query(&query.query_pairs());
        let listing: OrderListing = self.json(request).await?;
        Ok(listing.into_page())
    }

    #[instrument(skip(self), fields(order_id = %id, status = %update.new_status))]
    async fn admin_update_status(&self, id: OrderId, update: StatusUpdate) -> Result<Order, ApiError> {
        let request = self
            .http
            .patch(self.config.url(&format!("/admin/orders/{id}/status")))
            .json(&update);
        self.json(request).await
    }

    #[instrument(skip(self))]
    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        self.json(
            self.http
                .get(self.config.url(&format!("/reviews/product/{product_id}"))),
        )
        .await
    }

    #[instrument(skip(self, review), fields(product_id = %review.product_id, rating = review.rating))]
    async fn create_review(&self, review: NewReview) -> Result<Review, ApiError> {
        self.json(self.http.post(self.config.url("/reviews")).json(&review))
            .await
    }
}
