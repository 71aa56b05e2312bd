//! `fp orders`.

use tracing::info;

use foodpoint_core::OrderId;

use super::Context;

pub async fn list(ctx: &Context) -> foodpoint_client::Result<()> {
    let orders = ctx.api.list_orders().await?;
    if orders.is_empty() {
        info!("No orders yet");
    }

    for order in &orders {
        info!(
            "  {}  {:<24} {:<10} {:>9.2}  {:?}",
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.order_id.as_deref().unwrap_or(order.id.as_str()),
            order.placed_by.as_deref().unwrap_or("-"),
            order.total_amount,
            order.status
        );
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: &str) -> foodpoint_client::Result<()> {
    let order = ctx.api.get_order(&OrderId::new(id)).await?;

    info!(
        "Order {} ({:?}) placed {}",
        order.order_id.as_deref().unwrap_or(order.id.as_str()),
        order.status,
        order.created_at.to_rfc2822()
    );
    if let Some(address) = &order.address {
        info!("Address: {address}");
    }
    for item in &order.items {
        info!(
            "  {:>3} x {:<28} {:>8.2}",
            item.quantity,
            item.name,
            item.line_total()
        );
    }
    info!("Total: {:.2}", order.total_amount);
    Ok(())
}

pub async fn stats(ctx: &Context) -> foodpoint_client::Result<()> {
    let stats = ctx.api.order_stats().await?;
    info!("Orders: {}", stats.orders);
    info!("Revenue: {:.2}", stats.revenue);
    Ok(())
}
