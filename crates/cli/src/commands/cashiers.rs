//! `fp cashiers`.

use tracing::info;

use foodpoint_core::UserId;

use super::Context;

pub async fn list(ctx: &Context) -> foodpoint_client::Result<()> {
    let cashiers = ctx.api.list_cashiers().await?;
    info!("{} cashiers", cashiers.len());
    for cashier in cashiers {
        info!("  {:<26} {:<32} {}", cashier.id, cashier.email, cashier.name);
    }
    Ok(())
}

pub async fn delete(ctx: &Context, id: &str) -> foodpoint_client::Result<()> {
    let ack = ctx.api.delete_cashier(&UserId::new(id)).await?;
    info!("{}", ack.message.as_deref().unwrap_or("Cashier deleted"));
    Ok(())
}
