use storefront_core::{ApiError, ErrorKind, OrderId, OrderStatus};

pub const CANCEL_UNKNOWN: &str = "Lỗi không xác định khi hủy đơn hàng.";

/// Row-scoped message for a failed customer cancel.
pub fn cancel_failed(message: &str) -> String {
    format!("Hủy đơn thất bại: {message}")
}

/// Detail-scoped message for a failed admin status change.
pub fn update_failed(message: &str) -> String {
    format!("Lỗi cập nhật: {message}")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Order {id} cannot be cancelled while {status}")]
    NotCancellable { id: OrderId, status: OrderStatus },
    #[error("Đơn hàng đã hoàn tất hoặc đã hủy, không thể thay đổi trạng thái.")]
    TerminalOrder(OrderStatus),
    #[error("Order is already {0}")]
    SameStatus(OrderStatus),
    #[error("No order is open")]
    NoOrderSelected,
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::Api(e) => e.kind(),
            _ => ErrorKind::Local,
        }
    }
}
