use std::collections::HashMap;
use storefront_core::{CartLine, ProductId};

/// Last observed stock per product.
///
/// Never assumed to match the server: it is only a fallback for when a fresh
/// read is unavailable.
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    levels: HashMap<ProductId, u32>,
}

impl StockSnapshot {
    pub fn record(&mut self, product_id: ProductId, stock: u32) {
        self.levels.insert(product_id, stock);
    }

    pub fn get(&self, product_id: ProductId) -> Option<u32> {
        self.levels.get(&product_id).copied()
    }

    /// Best known stock for a line: the snapshot, else the stock embedded in
    /// the line's product.
    pub fn for_line(&self, line: &CartLine) -> u32 {
        self.get(line.product_id())
            .unwrap_or(line.product.stock_quantity)
    }
}
