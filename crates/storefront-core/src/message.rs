//! # Backend Messages
//!
//! One message per REST endpoint, each carrying a oneshot responder. The
//! [`ChannelBackend`](crate::ChannelBackend) turns trait calls into these
//! messages; the sandbox actor and the mock consume them.

use crate::error::ApiError;
use crate::model::{
    AddToCart, Address, Cart, CartItemId, NewReview, Order, OrderId, OrderQuery, Page, PlaceOrder,
    Product, ProductId, Review, StatusUpdate,
};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel.
pub type Response<T> = oneshot::Sender<Result<T, ApiError>>;

#[derive(Debug)]
pub enum BackendRequest {
    GetProduct {
        id: ProductId,
        respond_to: Response<Product>,
    },
    GetCart {
        respond_to: Response<Cart>,
    },
    AddToCart {
        item: AddToCart,
        respond_to: Response<Cart>,
    },
    UpdateCartItem {
        id: CartItemId,
        quantity: u32,
        respond_to: Response<Cart>,
    },
    RemoveCartItem {
        id: CartItemId,
        respond_to: Response<Cart>,
    },
    ClearCart {
        respond_to: Response<Cart>,
    },
    ListAddresses {
        respond_to: Response<Vec<Address>>,
    },
    PlaceOrder {
        order: PlaceOrder,
        respond_to: Response<Order>,
    },
    ListOrders {
        respond_to: Response<Vec<Order>>,
    },
    CancelOrder {
        id: OrderId,
        respond_to: Response<()>,
    },
    AdminListOrders {
        query: OrderQuery,
        respond_to: Response<Page<Order>>,
    },
    AdminUpdateStatus {
        id: OrderId,
        update: StatusUpdate,
        respond_to: Response<Order>,
    },
    ListReviews {
        product_id: ProductId,
        respond_to: Response<Vec<Review>>,
    },
    CreateReview {
        review: NewReview,
        respond_to: Response<Review>,
    },
}

impl BackendRequest {
    /// The REST route this message stands for, e.g.
    /// `PATCH /user/cart/items/7?quantity=10`.
    pub fn route(&self) -> String {
        match self {
            BackendRequest::GetProduct { id, .. } => format!("GET /products/{id}"),
            BackendRequest::GetCart { .. } => "GET /user/cart".to_string(),
            BackendRequest::AddToCart { .. } => "POST /user/cart/add".to_string(),
            BackendRequest::UpdateCartItem { id, quantity, .. } => {
                format!("PATCH /user/cart/items/{id}?quantity={quantity}")
            }
            BackendRequest::RemoveCartItem { id, .. } => format!("DELETE /user/cart/items/{id}"),
            BackendRequest::ClearCart { .. } => "DELETE /user/cart/clear".to_string(),
            BackendRequest::ListAddresses { .. } => "GET /user/addresses".to_string(),
            BackendRequest::PlaceOrder { .. } => "POST /user/orders".to_string(),
            BackendRequest::ListOrders { .. } => "GET /user/orders".to_string(),
            BackendRequest::CancelOrder { id, .. } => format!("PATCH /user/orders/{id}/cancel"),
            BackendRequest::AdminListOrders { .. } => "GET /admin/orders".to_string(),
            BackendRequest::AdminUpdateStatus { id, .. } => {
                format!("PATCH /admin/orders/{id}/status")
            }
            BackendRequest::ListReviews { product_id, .. } => {
                format!("GET /reviews/product/{product_id}")
            }
            BackendRequest::CreateReview { .. } => "POST /reviews".to_string(),
        }
    }

    /// Whether the request changes server state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            BackendRequest::GetProduct { .. }
                | BackendRequest::GetCart { .. }
                | BackendRequest::ListAddresses { .. }
                | BackendRequest::ListOrders { .. }
                | BackendRequest::AdminListOrders { .. }
                | BackendRequest::ListReviews { .. }
        )
    }
}
