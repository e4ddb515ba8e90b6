//! Cart payloads.
//!
//! The cart is never patched locally: every mutating endpoint answers with
//! the full, server-computed [`Cart`], and that answer replaces whatever the
//! client held before.

use serde::{Deserialize, Serialize};

use crate::model::{id_type, Product, ProductId};

id_type!(
    /// Type-safe identifier for a cart line, stable for the life of the line.
    CartItemId
);

/// One product + quantity entry in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
    /// `quantity * product.price`, as computed by the backend.
    #[serde(default)]
    pub subtotal: f64,
}

impl CartLine {
    /// Builds a line with the subtotal derived from the product price.
    pub fn new(id: CartItemId, product: Product, quantity: u32) -> Self {
        let subtotal = product.price * f64::from(quantity);
        Self {
            id,
            product,
            quantity,
            subtotal,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub total_cart_price: f64,
}

impl Cart {
    /// Builds a cart whose total is the sum of the line subtotals.
    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total_cart_price = items.iter().map(|line| line.subtotal).sum();
        Self {
            items,
            total_cart_price,
        }
    }

    pub fn line(&self, id: CartItemId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.id == id)
    }

    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.product.id == product_id)
    }

    pub fn contains(&self, id: CartItemId) -> bool {
        self.line(id).is_some()
    }

    /// Total number of units across all lines (the navbar badge).
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Body of `POST /user/cart/add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
}
