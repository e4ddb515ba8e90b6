//! Cart page logic: quantities, stock reconciliation, selection.

pub mod error;
pub mod reconciler;
pub mod selection;
pub mod stock;

pub use error::CartError;
pub use reconciler::{CartReconciler, NoticeScope, QuantityChange, QuantityOutcome};
pub use selection::Selection;
pub use stock::StockSnapshot;
