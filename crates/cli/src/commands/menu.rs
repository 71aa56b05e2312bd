//! `fp menu`.

use tracing::{info, warn};

use foodpoint_client::MenuCatalog;
use foodpoint_client::catalog::MenuSnapshot;

use super::Context;

/// Print the menu once, or keep printing it for `watch` polling ticks.
pub async fn show(ctx: &Context, watch: Option<u32>) -> foodpoint_client::Result<()> {
    if !ctx.api.has_credentials() {
        warn!("The menu is only available to signed-in users");
        return Ok(());
    }

    let catalog = MenuCatalog::new(ctx.api.clone());

    let Some(ticks) = watch else {
        catalog.refresh().await?;
        print_menu(&catalog.snapshot());
        return Ok(());
    };

    let mut updates = catalog.subscribe();
    let poller = catalog.spawn_polling(ctx.config.refresh_interval);

    for _ in 0..ticks {
        if updates.changed().await.is_err() {
            break;
        }
        let snapshot = updates.borrow_and_update().clone();
        match &snapshot.error {
            Some(error) => warn!("Refresh failed: {error}"),
            None => print_menu(&snapshot),
        }
        // Signed out by a 401; further ticks would all be skipped.
        if !ctx.api.has_credentials() {
            break;
        }
    }

    poller.stop();
    Ok(())
}

fn print_menu(snapshot: &MenuSnapshot) {
    let items = snapshot.items();
    info!(
        "{} deals, {} products ({})",
        snapshot.deals.len(),
        snapshot.products.len(),
        snapshot.categories().join(", ")
    );
    for item in items {
        info!(
            "  {:<8} {:<24} {:>8}  {}",
            format!("{:?}", item.kind).to_lowercase(),
            item.id,
            item.price,
            item.name
        );
    }
}
