use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use storefront::{ActionOutcome, AdminOrders, AlwaysConfirm, CustomerOrders, FnConfirm, NeverConfirm, OrderError};
use storefront_core::mock::MockBackend;
use storefront_core::{ApiError, ErrorKind, Order, OrderId, OrderItem, OrderQuery, OrderStatus, Page, ProductId};

fn order(id: u64, status: OrderStatus, hour: u32) -> Order {
    let created_at = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap();
    Order::new(
        OrderId(id),
        status,
        vec![OrderItem {
            product_id: ProductId(3),
            product_name: "Tủ quần áo".into(),
            quantity: 1,
            price_at_purchase: 4_200_000.0,
        }],
        created_at,
    )
}

fn status_patches(mock: &MockBackend) -> usize {
    mock.routes()
        .iter()
        .filter(|route| route.starts_with("PATCH"))
        .count()
}

// =============================================================================
// ADMIN
// =============================================================================

#[tokio::test]
async fn test_admin_delivers_shipping_order() {
    let mock = MockBackend::new();
    mock.expect_admin_list_orders()
        .return_ok(Page::single(vec![order(5, OrderStatus::Shipping, 9)]));
    mock.expect_admin_update_status(OrderId(5))
        .return_ok(order(5, OrderStatus::Delivered, 9));
    mock.expect_admin_list_orders()
        .return_ok(Page::single(vec![order(5, OrderStatus::Delivered, 9)]));

    let admin = AdminOrders::new(Arc::new(mock.backend()));
    admin.load(OrderQuery::default()).await.unwrap();

    // 1. Open the dialog: every status except the current one is offered
    admin.open_detail(OrderId(5)).unwrap();
    assert_eq!(
        admin.status_options(),
        vec![
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Delivered,
            OrderStatus::Cancelled
        ]
    );

    // 2. Change status: one PATCH, dialog closed, table reloaded
    let outcome = admin
        .change_status(OrderStatus::Delivered, &AlwaysConfirm)
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(admin.detail(), None);
    assert_eq!(status_patches(&mock), 1);
    assert_eq!(admin.orders()[0].status(), OrderStatus::Delivered);

    // 3. A delivered order offers no control
    admin.open_detail(OrderId(5)).unwrap();
    assert!(admin.status_options().is_empty());
    assert_eq!(
        admin
            .change_status(OrderStatus::Pending, &AlwaysConfirm)
            .await,
        Err(OrderError::TerminalOrder(OrderStatus::Delivered))
    );
    assert_eq!(status_patches(&mock), 1);
    mock.verify();
}

#[tokio::test]
async fn test_admin_listing_is_newest_first() {
    let mock = MockBackend::new();
    mock.expect_admin_list_orders().return_ok(Page::single(vec![
        order(1, OrderStatus::Pending, 8),
        order(3, OrderStatus::Pending, 14),
        order(2, OrderStatus::Confirmed, 11),
    ]));

    let admin = AdminOrders::new(Arc::new(mock.backend()));
    let page = admin.load(OrderQuery::default()).await.unwrap();
    let ids: Vec<OrderId> = page.content.iter().map(Order::id).collect();
    assert_eq!(ids, vec![OrderId(3), OrderId(2), OrderId(1)]);
    mock.verify();
}

#[tokio::test]
async fn test_admin_refusals_send_nothing() {
    let mock = MockBackend::new();
    mock.expect_admin_list_orders().return_ok(Page::single(vec![
        order(1, OrderStatus::Confirmed, 8),
        order(2, OrderStatus::Cancelled, 9),
    ]));
    let admin = AdminOrders::new(Arc::new(mock.backend()));
    admin.load(OrderQuery::default()).await.unwrap();

    assert_eq!(
        admin.change_status(OrderStatus::Shipping, &AlwaysConfirm).await,
        Err(OrderError::NoOrderSelected)
    );

    admin.open_detail(OrderId(1)).unwrap();
    assert_eq!(
        admin.change_status(OrderStatus::Confirmed, &AlwaysConfirm).await,
        Err(OrderError::SameStatus(OrderStatus::Confirmed))
    );
    assert_eq!(
        admin.change_status(OrderStatus::Shipping, &NeverConfirm).await,
        Ok(ActionOutcome::Declined)
    );

    admin.open_detail(OrderId(2)).unwrap();
    let err = admin
        .change_status(OrderStatus::Pending, &AlwaysConfirm)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Local);
    assert_eq!(
        err.to_string(),
        "Đơn hàng đã hoàn tất hoặc đã hủy, không thể thay đổi trạng thái."
    );

    assert_eq!(
        admin.open_detail(OrderId(42)),
        Err(OrderError::OrderNotFound(OrderId(42)))
    );
    assert_eq!(status_patches(&mock), 0);
    mock.verify();
}

#[tokio::test]
async fn test_admin_rejection_keeps_dialog_and_prior_status() {
    let mock = MockBackend::new();
    mock.expect_admin_list_orders()
        .return_ok(Page::single(vec![order(4, OrderStatus::Pending, 8)]));
    mock.expect_admin_update_status(OrderId(4)).return_err(ApiError::bad_request(
        "Cannot change order status from PENDING to DELIVERED",
    ));

    let admin = AdminOrders::new(Arc::new(mock.backend()));
    admin.load(OrderQuery::default()).await.unwrap();
    admin.open_detail(OrderId(4)).unwrap();

    let prompts = std::sync::Mutex::new(Vec::new());
    let confirm = FnConfirm(|prompt: &str| {
        prompts.lock().unwrap().push(prompt.to_string());
        true
    });
    let err = admin
        .change_status(OrderStatus::Delivered, &confirm)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ValidationRejected);
    assert_eq!(
        prompts.lock().unwrap().as_slice(),
        ["Bạn có chắc muốn chuyển trạng thái sang DELIVERED?"]
    );
    assert_eq!(
        admin.detail_error().as_deref(),
        Some("Lỗi cập nhật: Cannot change order status from PENDING to DELIVERED")
    );
    assert_eq!(admin.detail().unwrap().status(), OrderStatus::Pending);
    assert!(!admin.is_updating());
    // No reload after a failure
    assert_eq!(mock.routes().len(), 2);
    mock.verify();
}

// =============================================================================
// CUSTOMER
// =============================================================================

const TTL: Duration = Duration::from_secs(4);

#[tokio::test]
async fn test_customer_cancels_pending_order() {
    let mock = MockBackend::new();
    mock.expect_list_orders()
        .return_ok(vec![order(8, OrderStatus::Pending, 10)]);
    mock.expect_cancel_order(OrderId(8)).return_ok(());
    mock.expect_list_orders()
        .return_ok(vec![order(8, OrderStatus::Cancelled, 10)]);

    let orders = CustomerOrders::new(Arc::new(mock.backend()), TTL);
    orders.load().await.unwrap();
    assert!(orders.can_cancel(OrderId(8)));

    let outcome = orders.cancel(OrderId(8), &AlwaysConfirm).await.unwrap();
    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(orders.orders()[0].status(), OrderStatus::Cancelled);
    assert!(!orders.can_cancel(OrderId(8)));
    mock.verify();
}

#[tokio::test]
async fn test_customer_cannot_cancel_after_pending() {
    let mock = MockBackend::new();
    mock.expect_list_orders().return_ok(vec![
        order(1, OrderStatus::Confirmed, 8),
        order(2, OrderStatus::Shipping, 9),
    ]);
    let orders = CustomerOrders::new(Arc::new(mock.backend()), TTL);
    orders.load().await.unwrap();

    assert!(!orders.can_cancel(OrderId(1)));
    assert_eq!(
        orders.cancel(OrderId(1), &AlwaysConfirm).await,
        Err(OrderError::NotCancellable {
            id: OrderId(1),
            status: OrderStatus::Confirmed
        })
    );
    assert!(orders.cancel(OrderId(2), &AlwaysConfirm).await.is_err());
    assert_eq!(status_patches(&mock), 0);
    mock.verify();
}

#[tokio::test]
async fn test_customer_cancel_failures_are_row_scoped() {
    let mock = MockBackend::new();
    mock.expect_list_orders().return_ok(vec![
        order(1, OrderStatus::Pending, 8),
        order(2, OrderStatus::Pending, 9),
    ]);
    mock.expect_cancel_order(OrderId(1))
        .return_err(ApiError::bad_request("Only pending orders can be cancelled"));
    mock.expect_cancel_order(OrderId(2))
        .return_err(ApiError::Transport("connection reset".into()));

    let orders = CustomerOrders::new(Arc::new(mock.backend()), TTL);
    orders.load().await.unwrap();

    assert!(orders.cancel(OrderId(1), &AlwaysConfirm).await.is_err());
    assert_eq!(
        orders.row_error(OrderId(1)).as_deref(),
        Some("Hủy đơn thất bại: Only pending orders can be cancelled")
    );

    assert!(orders.cancel(OrderId(2), &AlwaysConfirm).await.is_err());
    assert_eq!(
        orders.row_error(OrderId(2)).as_deref(),
        Some("Hủy đơn thất bại: Lỗi không xác định khi hủy đơn hàng.")
    );

    // List untouched, no reload
    assert!(orders.orders().iter().all(|o| o.status() == OrderStatus::Pending));
    assert_eq!(mock.routes().iter().filter(|r| r.starts_with("GET")).count(), 1);
    mock.verify();
}

#[tokio::test]
async fn test_declined_cancel_sends_nothing() {
    let mock = MockBackend::new();
    mock.expect_list_orders()
        .return_ok(vec![order(1, OrderStatus::Pending, 8)]);
    let orders = CustomerOrders::new(Arc::new(mock.backend()), TTL);
    orders.load().await.unwrap();

    assert_eq!(
        orders.cancel(OrderId(1), &NeverConfirm).await,
        Ok(ActionOutcome::Declined)
    );
    assert_eq!(mock.routes().len(), 1);
    mock.verify();
}
