//! # Storefront
//!
//! Client-side controllers for a furniture storefront, built on
//! [`storefront_core`].
//!
//! - **[cart]**: the [`CartReconciler`](cart::CartReconciler), which keeps cart
//!   quantities within live stock while only one mutation is in flight, and
//!   the checkout [`Selection`](cart::Selection).
//! - **[checkout]**: turns selected lines into an order.
//! - **[orders]**: the customer cancel flow and the admin status dialog, both
//!   bound by the order lifecycle.
//! - **[reviews]**: the product review list and form.
//! - **[lifecycle]**: the [`Storefront`](lifecycle::Storefront) orchestrator
//!   wiring everything to a sandbox or HTTP backend.
//!
//! ## Testing
//!
//! See [`storefront_core::mock`] for scripted backends, and
//! [`storefront_core::SandboxBackend`] for stateful end-to-end tests.

pub mod cart;
pub mod checkout;
pub mod confirm;
pub mod guard;
pub mod lifecycle;
pub mod notices;
pub mod orders;
pub mod reviews;

pub use cart::{CartError, CartReconciler, QuantityChange, QuantityOutcome};
pub use checkout::{Checkout, CheckoutError};
pub use confirm::{ActionOutcome, AlwaysConfirm, Confirm, FnConfirm, NeverConfirm};
pub use lifecycle::Storefront;
pub use orders::{AdminOrders, CustomerOrders, OrderError};
pub use reviews::{ReviewError, Reviews};
