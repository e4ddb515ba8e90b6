//! Order status controllers.
//!
//! Both controllers drive the same lifecycle ([`OrderStatus`]) from opposite
//! sides: customers may only cancel a pending order, admins move orders along
//! the transition table. Neither applies a transition locally; after every
//! accepted change the list is re-read from the server.
//!
//! [`OrderStatus`]: storefront_core::OrderStatus

pub mod admin;
pub mod customer;
pub mod error;

pub use admin::AdminOrders;
pub use customer::CustomerOrders;
pub use error::OrderError;
