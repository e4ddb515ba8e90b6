//! # Storefront Lifecycle
//!
//! Wires the controllers to a backend and tears everything down again.
//!
//! **Key Responsibilities:**
//! 1. **Backend Creation** - An in-process sandbox actor, or the HTTP transport
//! 2. **Dependency Injection** - Every controller receives the same
//!    [`SharedBackend`](storefront_core::SharedBackend) and [`Session`](storefront_core::Session)
//! 3. **Graceful Shutdown** - Drop every backend handle, then await the actor
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let session = Arc::new(Session::anonymous());
//! let (storefront, sandbox) = Storefront::sandbox(&config, session);
//!
//! storefront.cart.load().await?;
//! // ... drive the cart and order controllers ...
//!
//! storefront.shutdown().await?;
//! ```
//!
//! ## Graceful Shutdown
//!
//! 1. **Drop all controllers** - Each holds a clone of the backend
//! 2. **Actor detects closure** - `receiver.recv()` returns `None`
//! 3. **Await completion** - Wait for the sandbox task to finish
//!
//! The [`SandboxHandle`](storefront_core::SandboxHandle) does not keep the
//! actor alive, so it can outlive the storefront safely.

pub mod storefront;

pub use self::storefront::*;
