//! `fp checkout`.

use tracing::info;

use foodpoint_client::{CheckoutService, OrderType};

use super::Context;

pub async fn submit(ctx: &Context, order_type: &OrderType) -> foodpoint_client::Result<()> {
    let checkout = CheckoutService::new(ctx.api.clone(), ctx.session.clone(), ctx.cart.clone());
    let receipt = checkout.submit(order_type).await?;

    info!(
        "Order {} placed: {} items, total {:.2}",
        receipt.order_id, receipt.units, receipt.total
    );
    if let Some(message) = receipt.message {
        info!("{message}");
    }
    Ok(())
}
