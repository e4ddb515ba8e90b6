//! # Storefront Core
//!
//! The building blocks shared by every storefront client: the wire model, the
//! [`StorefrontBackend`] seam and its transports, the session context and the
//! ambient configuration.
//!
//! ## Architecture Overview
//!
//! 1. **Model Layer** ([`model`]) - Serde types mirroring the REST bodies
//! 2. **Seam** ([`StorefrontBackend`]) - One async method per endpoint
//! 3. **Transports** - [`HttpBackend`] for the real server, [`ChannelBackend`]
//!    for anything that answers [`BackendRequest`] messages
//!
//! The [`SandboxBackend`] actor and the [`mock`] module both sit behind a
//! [`ChannelBackend`], so controller code never knows whether it talks to the
//! network, an in-process store, or a scripted test double.
//!
//! ```rust
//! use storefront_core::{AddToCart, SandboxBackend, StorefrontBackend};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (sandbox, backend, handle) = SandboxBackend::new(32);
//!     let task = tokio::spawn(sandbox.run());
//!
//!     let lamp = handle.seed_product("Đèn bàn", 45.0, 2).await.unwrap();
//!     let cart = backend
//!         .add_to_cart(AddToCart { product_id: lamp, quantity: 2 })
//!         .await
//!         .unwrap();
//!     assert_eq!(cart.item_count(), 2);
//!
//!     // Over the stock limit: rejected, cart untouched server-side.
//!     let err = backend
//!         .add_to_cart(AddToCart { product_id: lamp, quantity: 1 })
//!         .await
//!         .unwrap_err();
//!     assert_eq!(err.to_string(), "Insufficient stock: requested 3, available 2");
//!
//!     drop(backend);
//!     task.await.unwrap();
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every transport reports failures as [`ApiError`]; [`ApiError::kind`] maps
//! them onto the shared [`ErrorKind`] taxonomy.

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod message;
pub mod mock;
pub mod model;
pub mod sandbox;
pub mod session;
pub mod tracing;

pub use backend::{SharedBackend, StorefrontBackend};
pub use client::ChannelBackend;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ErrorKind};
pub use http::HttpBackend;
pub use message::{BackendRequest, Response};
pub use model::*;
pub use sandbox::{SandboxBackend, SandboxCommand, SandboxHandle};
pub use session::{MemorySessionStore, Session, SessionError, SessionStore};
