//! Orders and the order lifecycle.
//!
//! [`OrderStatus`] carries the transition table shared by the customer-facing
//! cancel affordance and the admin-facing status control:
//!
//! ```text
//! PENDING   -> CONFIRMED | CANCELLED
//! CONFIRMED -> SHIPPING  | CANCELLED   (admin only)
//! SHIPPING  -> DELIVERED
//! DELIVERED -> (terminal)
//! CANCELLED -> (terminal)
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::model::{id_type, AddressId, CartItemId, ProductId};

id_type!(
    /// Type-safe identifier for Orders.
    OrderId
);

/// The finite set of order states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

/// Who is asking for a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Admin,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipping,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Legal next states, regardless of who asks.
    pub fn successors(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Shipping, OrderStatus::Cancelled],
            OrderStatus::Shipping => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    /// Whether `actor` may move an order from `self` to `target`.
    ///
    /// Customers can only cancel, and only while the order is still pending.
    /// A customer cancel from `CONFIRMED` is deliberately refused: the system
    /// of record has not defined it.
    pub fn can_transition(self, target: OrderStatus, actor: Actor) -> bool {
        match actor {
            Actor::Customer => self.customer_can_cancel() && target == OrderStatus::Cancelled,
            Actor::Admin => self.successors().contains(&target),
        }
    }

    pub fn customer_can_cancel(self) -> bool {
        self == OrderStatus::Pending
    }

    /// Targets offered by the admin status control.
    ///
    /// Terminal orders get no control at all. Otherwise every status except
    /// the current one is offered; the backend rejects illegal jumps.
    pub fn admin_options(self) -> Vec<OrderStatus> {
        if self.is_terminal() {
            return Vec::new();
        }
        Self::ALL.into_iter().filter(|status| *status != self).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Display label used by the storefront UI.
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Chờ xử lý",
            OrderStatus::Confirmed => "Đã xác nhận",
            OrderStatus::Shipping => "Đang giao",
            OrderStatus::Delivered => "Đã giao hàng",
            OrderStatus::Cancelled => "Đã hủy",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchased line, frozen at the price paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub price_at_purchase: f64,
}

/// Represents a placed order.
///
/// Fields are read-only: items and `price_at_purchase` never change once the
/// order exists, and the status only ever changes on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_id: OrderId,
    status: OrderStatus,
    #[serde(default)]
    items: Vec<OrderItem>,
    total_amount: f64,
    created_at: NaiveDateTime,
    #[serde(default)]
    customer_note: Option<String>,
}

impl Order {
    /// Creates a new Order with the total derived from the items.
    pub fn new(
        order_id: OrderId,
        status: OrderStatus,
        items: Vec<OrderItem>,
        created_at: NaiveDateTime,
    ) -> Self {
        let total_amount = items
            .iter()
            .map(|item| item.price_at_purchase * f64::from(item.quantity))
            .sum();
        Self {
            order_id,
            status,
            items,
            total_amount,
            created_at,
            customer_note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.customer_note = Some(note.into());
        self
    }

    pub fn id(&self) -> OrderId {
        self.order_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn customer_note(&self) -> Option<&str> {
        self.customer_note.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

/// Body of `POST /user/orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub address_id: AddressId,
    pub cart_item_ids: Vec<CartItemId>,
    pub customer_note: String,
}

/// Body of `PATCH /admin/orders/{orderId}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub new_status: OrderStatus,
}

/// Filters for `GET /admin/orders`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrderQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        pairs
    }
}

/// A page of results in the backend's paging envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Page<T> {
    /// Wraps a complete, unpaged list.
    pub fn single(content: Vec<T>) -> Self {
        let len = content.len();
        Self {
            total_elements: len as u64,
            total_pages: u32::from(len > 0),
            number: 0,
            size: u32::try_from(len).unwrap_or(u32::MAX),
            content,
        }
    }
}

/// The admin listing answers either with a page envelope or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderListing {
    Paged(Page<Order>),
    Plain(Vec<Order>),
}

impl OrderListing {
    pub fn into_page(self) -> Page<Order> {
        match self {
            OrderListing::Paged(page) => page,
            OrderListing::Plain(orders) => Page::single(orders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Confirmed.is_terminal());
        assert!(!OrderStatus::Shipping.is_terminal());
        assert!(OrderStatus::Delivered.successors().is_empty());
        assert!(OrderStatus::Cancelled.successors().is_empty());
    }

    #[test]
    fn test_admin_transitions_follow_the_table() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Confirmed, Actor::Admin));
        assert!(Pending.can_transition(Cancelled, Actor::Admin));
        assert!(Confirmed.can_transition(Shipping, Actor::Admin));
        assert!(Confirmed.can_transition(Cancelled, Actor::Admin));
        assert!(Shipping.can_transition(Delivered, Actor::Admin));

        assert!(!Pending.can_transition(Delivered, Actor::Admin));
        assert!(!Shipping.can_transition(Cancelled, Actor::Admin));
        assert!(!Delivered.can_transition(Pending, Actor::Admin));
        assert!(!Cancelled.can_transition(Pending, Actor::Admin));
    }

    #[test]
    fn test_customer_may_only_cancel_pending() {
        use OrderStatus::*;
        assert!(Pending.customer_can_cancel());
        assert!(Pending.can_transition(Cancelled, Actor::Customer));
        assert!(!Pending.can_transition(Confirmed, Actor::Customer));
        for status in [Confirmed, Shipping, Delivered, Cancelled] {
            assert!(!status.customer_can_cancel(), "{status} must not be cancellable");
            assert!(!status.can_transition(Cancelled, Actor::Customer));
        }
    }

    #[test]
    fn test_admin_options_exclude_terminal_and_current() {
        assert!(OrderStatus::Delivered.admin_options().is_empty());
        assert!(OrderStatus::Cancelled.admin_options().is_empty());

        let options = OrderStatus::Shipping.admin_options();
        assert_eq!(options.len(), 4);
        assert!(!options.contains(&OrderStatus::Shipping));
        assert!(options.contains(&OrderStatus::Delivered));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&StatusUpdate {
            new_status: OrderStatus::Shipping,
        })
        .unwrap();
        assert_eq!(json, r#"{"newStatus":"SHIPPING"}"#);

        let status: OrderStatus = serde_json::from_str(r#""CANCELLED""#).unwrap();
        assert_eq!(status, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_total_uses_price_at_purchase() {
        let order = Order::new(
            OrderId(1),
            OrderStatus::Pending,
            vec![OrderItem {
                product_id: ProductId(4),
                product_name: "Tủ".into(),
                quantity: 2,
                price_at_purchase: 300.0,
            }],
            at(9),
        );
        assert_eq!(order.total_amount(), 600.0);
        assert_eq!(order.items()[0].price_at_purchase, 300.0);
    }

    #[test]
    fn test_listing_accepts_page_or_array() {
        let order = r#"{"orderId": 5, "status": "PENDING", "items": [], "totalAmount": 0.0, "createdAt": "2024-05-01T09:00:00"}"#;

        let paged: OrderListing = serde_json::from_str(&format!(
            r#"{{"content": [{order}], "totalElements": 11, "totalPages": 2, "number": 1, "size": 10}}"#
        ))
        .unwrap();
        let page = paged.into_page();
        assert_eq!(page.total_elements, 11);
        assert_eq!(page.content[0].id(), OrderId(5));

        let plain: OrderListing = serde_json::from_str(&format!("[{order}]")).unwrap();
        let page = plain.into_page();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].created_at(), at(9));
    }

    #[test]
    fn test_query_pairs_skip_unset_filters() {
        let query = OrderQuery {
            page: Some(2),
            size: None,
            status: Some(OrderStatus::Pending),
        };
        assert_eq!(
            query.query_pairs(),
            vec![("page", "2".to_string()), ("status", "PENDING".to_string())]
        );
    }
}
