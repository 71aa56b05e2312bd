//! `fp cart`.

use tracing::{info, warn};

use foodpoint_client::{MenuCatalog, RefreshOutcome};
use foodpoint_core::{CartItemId, ItemKind};

use super::Context;

pub fn show(ctx: &Context) {
    let cart = ctx.cart.cart();
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    for line in cart.items() {
        info!(
            "  {:<24} {:>3} x {:>8} = {:>8.2}  {}",
            line.id,
            line.quantity,
            line.price,
            line.line_total(),
            line.name
        );
    }
    info!("{} items, total {:.2}", cart.count(), cart.total());
}

/// Look the item up on the live menu and add one unit.
pub async fn add(ctx: &Context, id: &str, kind: ItemKind) -> foodpoint_client::Result<()> {
    let catalog = MenuCatalog::new(ctx.api.clone());
    if let RefreshOutcome::Skipped(reason) = catalog.refresh().await? {
        warn!(?reason, "Menu unavailable, sign in first");
        return Ok(());
    }

    let item = catalog
        .items()
        .into_iter()
        .find(|item| item.id.as_str() == id && item.kind == kind);

    match item {
        Some(item) => {
            ctx.cart.add_to_cart(item.to_cart_item())?;
            info!("Added {} ({} in cart)", item.name, ctx.cart.cart_count());
        }
        None => warn!("No {kind:?} with id {id} on the menu"),
    }
    Ok(())
}

pub fn remove(ctx: &Context, id: &str) {
    if !ctx.cart.remove_from_cart(&CartItemId::new(id)) {
        warn!("Nothing in the cart with id {id}");
    }
    show(ctx);
}

pub fn set(ctx: &Context, id: &str, quantity: i64) -> foodpoint_client::Result<()> {
    ctx.cart.update_quantity(&CartItemId::new(id), quantity)?;
    show(ctx);
    Ok(())
}

pub fn clear(ctx: &Context) {
    ctx.cart.clear_cart();
    info!("Cart cleared");
}
