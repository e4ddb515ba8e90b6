use serde::{Deserialize, Serialize};

use crate::model::id_type;

id_type!(
    /// Type-safe identifier for Products.
    ProductId
);

/// Represents a catalog product as returned by `GET /products/{id}`.
///
/// `stock_quantity` is a point-in-time observation. Another buyer or an admin
/// edit can change it at any moment, so callers must treat it as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: u32,
}

impl Product {
    /// Creates a new Product instance.
    ///
    /// # Arguments
    /// * `id` - Unique identifier assigned by the backend
    /// * `name` - Product name
    /// * `price` - Unit price
    /// * `stock_quantity` - Available stock at the time of observation
    pub fn new(id: ProductId, name: impl Into<String>, price: f64, stock_quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image_url: None,
            stock_quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_deserializes_backend_payload() {
        let json = r#"{
            "id": 12,
            "name": "Sofa gỗ sồi",
            "price": 4500000.0,
            "imageUrl": "/img/sofa.png",
            "stockQuantity": 3,
            "categoryName": "Sofa"
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId(12));
        assert_eq!(product.stock_quantity, 3);
        assert_eq!(product.image_url.as_deref(), Some("/img/sofa.png"));
    }

    #[test]
    fn test_missing_stock_defaults_to_zero() {
        let product: Product =
            serde_json::from_str(r#"{"id": 1, "name": "Ghế", "price": 10.0}"#).unwrap();
        assert_eq!(product.stock_quantity, 0);
    }
}
