//! `fp login`, `fp logout`, `fp whoami`.

use secrecy::SecretString;
use tracing::info;

use foodpoint_client::SessionState;

use super::Context;

/// Sign in and report where the role lands.
pub async fn login(ctx: &Context, email: &str, password: String) -> foodpoint_client::Result<()> {
    let password = SecretString::from(password);
    let (role, user) = ctx.session.login(&ctx.api, email, &password).await?;

    info!("Signed in as {} <{}> ({})", user.name, user.email, role);
    info!("Landing page: {}", role.landing_route());
    Ok(())
}

pub fn logout(ctx: &Context) {
    ctx.session.logout();
}

pub fn whoami(ctx: &Context) {
    match ctx.session.state() {
        SessionState::SignedIn { role, user } => {
            info!("{} <{}> ({})", user.name, user.email, role);
        }
        SessionState::SignedOut { reason } => info!("Not signed in ({reason:?})"),
        SessionState::Loading => info!("Session not loaded"),
    }
}
