use storefront_core::{ApiError, CartItemId, ErrorKind, ProductId};

/// Message shown when a quantity would exceed the stock on hand.
pub fn stock_notice(available: u32) -> String {
    format!("Chỉ còn {available} sản phẩm trong kho.")
}

pub const UPDATE_FAILED: &str = "Không thể cập nhật số lượng.";
pub const REMOVE_FAILED: &str = "Lỗi khi xóa sản phẩm.";
pub const CLEAR_FAILED: &str = "Không thể xóa giỏ hàng.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CartError {
    #[error("Chỉ còn {available} sản phẩm trong kho.")]
    StockExceeded {
        product_id: ProductId,
        available: u32,
    },
    #[error("Cart line not found: {0}")]
    LineNotFound(CartItemId),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Cart has not been loaded")]
    NotLoaded,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::StockExceeded { .. } => ErrorKind::StockExceeded,
            CartError::LineNotFound(_) | CartError::InvalidQuantity(_) | CartError::NotLoaded => {
                ErrorKind::Local
            }
            CartError::Api(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_exceeded_message_matches_notice() {
        let e = CartError::StockExceeded {
            product_id: ProductId(3),
            available: 3,
        };
        assert_eq!(e.to_string(), stock_notice(3));
        assert_eq!(e.kind(), ErrorKind::StockExceeded);
        assert_eq!(
            CartError::from(ApiError::Unauthorized).kind(),
            ErrorKind::AuthExpired
        );
    }
}
