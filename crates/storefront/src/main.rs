//! # Storefront Demo
//!
//! Runs a short shopping session against the in-process sandbox backend:
//! stock limits on the cart page, checkout, an admin moving the order to
//! delivery and a review of the delivered product.
//!
//! ```bash
//! RUST_LOG=info cargo run -p storefront
//! ```

use std::sync::Arc;
use storefront::{AlwaysConfirm, Storefront};
use storefront_core::tracing::setup_tracing;
use storefront_core::{ClientConfig, OrderQuery, OrderStatus, Role, Session, SessionUser};
use tracing::{info, warn, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ClientConfig::from_env().map_err(|e| e.to_string())?;
    let session = Arc::new(Session::anonymous());
    session
        .login("demo-token", SessionUser::new(1, "khach@example.com", Role::User))
        .map_err(|e| e.to_string())?;

    let (storefront, sandbox) = Storefront::sandbox(&config, session);

    let sofa = sandbox
        .seed_product("Sofa góc chữ L", 12_500_000.0, 3)
        .await
        .map_err(|e| e.to_string())?;
    let lamp = sandbox
        .seed_product("Đèn cây", 850_000.0, 10)
        .await
        .map_err(|e| e.to_string())?;
    sandbox
        .seed_address("Hà Nội", "Cầu Giấy", "Dịch Vọng Hậu")
        .await
        .map_err(|e| e.to_string())?;

    // Cart page
    let span = tracing::info_span!("cart_page");
    async {
        storefront.cart.add_product(sofa, 3).await?;
        storefront.cart.add_product(lamp, 1).await?;
        let cart = storefront.cart.load().await?;
        let sofa_line = cart.line_for_product(sofa).map(|line| line.id);
        let lamp_line = cart.line_for_product(lamp).map(|line| line.id);

        if let Some(line) = sofa_line {
            if let Err(e) = storefront.cart.increase(line).await {
                warn!(error = %e, "Increase refused");
            }
        }
        if let Some(line) = lamp_line {
            storefront.cart.edit_input(line, "999")?;
            let outcome = storefront.cart.commit_input(line).await?;
            info!(?outcome, notice = ?storefront.cart.notice(line), "Typed quantity committed");
        }
        Ok::<_, storefront::CartError>(())
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    info!(cart_count = storefront.session.cart_count(), "Badge updated");

    // Checkout
    storefront.cart.select_all(true);
    let lines = storefront.cart.checkout_lines().map_err(|e| e.to_string())?;
    let address = storefront
        .checkout
        .default_address()
        .await
        .map_err(|e| e.to_string())?;
    let order = storefront
        .checkout
        .place_order(&lines, address.map(|a| a.id), "Giao buổi sáng")
        .await
        .map_err(|e| e.to_string())?;
    info!(
        order_id = %order.id(),
        total = order.total_amount(),
        status = order.status().label(),
        "Checkout complete"
    );

    // Admin moves the order along
    let span = tracing::info_span!("admin_orders");
    async {
        storefront.admin.load(OrderQuery::default()).await?;
        for target in [OrderStatus::Confirmed, OrderStatus::Shipping, OrderStatus::Delivered] {
            storefront.admin.open_detail(order.id())?;
            storefront.admin.change_status(target, &AlwaysConfirm).await?;
        }
        storefront.admin.open_detail(order.id())?;
        info!(options = ?storefront.admin.status_options(), "Delivered order offers no transitions");
        Ok::<_, storefront::OrderError>(())
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    // Review the delivered sofa
    storefront.reviews.load(sofa).await.map_err(|e| e.to_string())?;
    storefront
        .reviews
        .submit(5, "Ngồi rất êm, giao đúng hẹn")
        .await
        .map_err(|e| e.to_string())?;
    info!(
        count = storefront.reviews.reviews().len(),
        average = ?storefront.reviews.average_rating(),
        "Review posted"
    );

    // Customer can no longer cancel
    storefront.orders.load().await.map_err(|e| e.to_string())?;
    for placed in storefront.orders.orders() {
        info!(
            order_id = %placed.id(),
            status = placed.status().label(),
            can_cancel = storefront.orders.can_cancel(placed.id()),
            "Order history"
        );
    }

    storefront.shutdown().await?;
    info!("Demo completed successfully");
    Ok(())
}
