//! # Channel Client
//!
//! [`ChannelBackend`] implements [`StorefrontBackend`] by forwarding every call
//! as a [`BackendRequest`] over a Tokio mpsc channel and awaiting the oneshot
//! reply. Whoever owns the receiving end (the sandbox actor, a mock, a test)
//! plays the server.

use crate::backend::StorefrontBackend;
use crate::error::ApiError;
use crate::message::{BackendRequest, Response};
use crate::model::{
    AddToCart, Address, Cart, CartItemId, NewReview, Order, OrderId, OrderQuery, Page, PlaceOrder,
    Product, ProductId, Review, StatusUpdate,
};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Cheap to clone: holds only the sender.
#[derive(Debug, Clone)]
pub struct ChannelBackend {
    sender: mpsc::Sender<BackendRequest>,
}

impl ChannelBackend {
    pub fn new(sender: mpsc::Sender<BackendRequest>) -> Self {
        Self { sender }
    }

    /// Creates a backend and the receiver that must answer its requests.
    pub fn channel(buffer_size: usize) -> (Self, mpsc::Receiver<BackendRequest>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self::new(sender), receiver)
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(Response<T>) -> BackendRequest + Send,
    ) -> Result<T, ApiError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| ApiError::BackendClosed)?;
        response.await.map_err(|_| ApiError::BackendDropped)?
    }
}

#[async_trait]
impl StorefrontBackend for ChannelBackend {
    async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.call(|respond_to| BackendRequest::GetProduct { id, respond_to })
            .await
    }

    async fn get_cart(&self) -> Result<Cart, ApiError> {
        self.call(|respond_to| BackendRequest::GetCart { respond_to })
            .await
    }

    async fn add_to_cart(&self, item: AddToCart) -> Result<Cart, ApiError> {
        self.call(|respond_to| BackendRequest::AddToCart { item, respond_to })
            .await
    }

    async fn update_cart_item(&self, id: CartItemId, quantity: u32) -> Result<Cart, ApiError> {
        self.call(|respond_to| BackendRequest::UpdateCartItem {
            id,
            quantity,
            respond_to,
        })
        .await
    }

    async fn remove_cart_item(&self, id: CartItemId) -> Result<Cart, ApiError> {
        self.call(|respond_to| BackendRequest::RemoveCartItem { id, respond_to })
            .await
    }

    async fn clear_cart(&self) -> Result<Cart, ApiError> {
        self.call(|respond_to| BackendRequest::ClearCart { respond_to })
            .await
    }

    async fn list_addresses(&self) -> Result<Vec<Address>, ApiError> {
        self.call(|respond_to| BackendRequest::ListAddresses { respond_to })
            .await
    }

    async fn place_order(&self, order: PlaceOrder) -> Result<Order, ApiError> {
        self.call(|respond_to| BackendRequest::PlaceOrder { order, respond_to })
            .await
    }

    async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.call(|respond_to| BackendRequest::ListOrders { respond_to })
            .await
    }

    async fn cancel_order(&self, id: OrderId) -> Result<(), ApiError> {
        self.call(|respond_to| BackendRequest::CancelOrder { id, respond_to })
            .await
    }

    async fn admin_list_orders(&self, query: OrderQuery) -> Result<Page<Order>, ApiError> {
        self.call(|respond_to| BackendRequest::AdminListOrders { query, respond_to })
            .await
    }

    async fn admin_update_status(
        &self,
        id: OrderId,
        update: StatusUpdate,
    ) -> Result<Order, ApiError> {
        self.call(|respond_to| BackendRequest::AdminUpdateStatus {
            id,
            update,
            respond_to,
        })
        .await
    }

    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        self.call(|respond_to| BackendRequest::ListReviews {
            product_id,
            respond_to,
        })
        .await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, ApiError> {
        self.call(|respond_to| BackendRequest::CreateReview { review, respond_to })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closed_receiver_reports_backend_closed() {
        let (backend, receiver) = ChannelBackend::channel(1);
        drop(receiver);

        let result = backend.get_cart().await;
        assert_eq!(result, Err(ApiError::BackendClosed));
    }

    #[tokio::test]
    async fn test_dropped_responder_reports_backend_dropped() {
        let (backend, mut receiver) = ChannelBackend::channel(1);

        let task = tokio::spawn(async move { backend.clear_cart().await });
        let request = receiver.recv().await.unwrap();
        assert_eq!(request.route(), "DELETE /user/cart/clear");
        drop(request);

        assert_eq!(task.await.unwrap(), Err(ApiError::BackendDropped));
    }
}
