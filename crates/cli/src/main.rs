//! FoodPoint CLI - take orders and manage the shop from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from --password or FOODPOINT_PASSWORD)
//! fp login -e cashier@foodpoint.test
//!
//! # Browse the menu, refreshing on the configured interval for 3 ticks
//! fp menu --watch 3
//!
//! # Build a cart and check out at the counter
//! fp cart add 65a1f0c2 --kind deal
//! fp cart set 65a1f0c2 2
//! fp checkout
//!
//! # Superadmin reporting
//! fp orders stats
//! fp cashiers list
//! ```
//!
//! # Commands
//!
//! - `login`, `logout`, `whoami` - Session management
//! - `menu` - Show the merged deals and products menu
//! - `cart` - Show and edit the local cart
//! - `checkout` - Submit the cart as an order
//! - `orders` - List, inspect and summarize orders
//! - `cashiers` - List and delete cashier accounts

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand, ValueEnum};
use foodpoint_client::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "fp")]
#[command(author, version, about = "FoodPoint ordering CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "FOODPOINT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Show the menu
    Menu {
        /// Keep refreshing for this many polling ticks
        #[arg(long)]
        watch: Option<u32>,
    },
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Submit the cart as an order
    Checkout {
        /// Delivery order (requires customer details)
        #[arg(long)]
        delivery: bool,
        #[arg(long, requires = "delivery")]
        name: Option<String>,
        #[arg(long, requires = "delivery")]
        phone: Option<String>,
        #[arg(long, requires = "delivery")]
        address: Option<String>,
        #[arg(long, requires = "delivery")]
        city: Option<String>,
        #[arg(long, requires = "delivery")]
        zip: Option<String>,
    },
    /// Inspect orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage cashier accounts (superadmin)
    Cashiers {
        #[command(subcommand)]
        action: CashiersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add one unit of a menu item
    Add {
        /// Product or deal ID
        id: String,
        #[arg(long, value_enum, default_value = "product")]
        kind: KindArg,
    },
    /// Remove every line with this ID
    Remove { id: String },
    /// Set a line's quantity (0 removes it)
    Set { id: String, quantity: i64 },
    /// Empty the cart
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Product,
    Deal,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List,
    /// Show one order
    Show { id: String },
    /// Order count and revenue
    Stats,
}

#[derive(Subcommand)]
enum CashiersAction {
    /// List cashier accounts
    List,
    /// Delete a cashier account
    Delete { id: String },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    use secrecy::ExposeSecret;

    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Warnings and errors become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "foodpoint_client=info,foodpoint_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().without_time().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        if e.requires_login() {
            tracing::info!("Run `fp login -e <email>` to sign in");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> foodpoint_client::Result<()> {
    let ctx = Context::load(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&ctx, &email, password).await?;
        }
        Commands::Logout => commands::session::logout(&ctx),
        Commands::Whoami => commands::session::whoami(&ctx),
        Commands::Menu { watch } => commands::menu::show(&ctx, watch).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx),
            CartAction::Add { id, kind } => commands::cart::add(&ctx, &id, kind.into()).await?,
            CartAction::Remove { id } => commands::cart::remove(&ctx, &id),
            CartAction::Set { id, quantity } => commands::cart::set(&ctx, &id, quantity)?,
            CartAction::Clear => commands::cart::clear(&ctx),
        },
        Commands::Checkout {
            delivery,
            name,
            phone,
            address,
            city,
            zip,
        } => {
            let order_type = if delivery {
                foodpoint_client::OrderType::Delivery(foodpoint_client::DeliveryDetails {
                    name: name.unwrap_or_default(),
                    phone: phone.unwrap_or_default(),
                    address: address.unwrap_or_default(),
                    city: city.unwrap_or_default(),
                    zip_code: zip.unwrap_or_default(),
                })
            } else {
                foodpoint_client::OrderType::WalkIn
            };
            commands::checkout::submit(&ctx, &order_type).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&ctx).await?,
            OrdersAction::Show { id } => commands::orders::show(&ctx, &id).await?,
            OrdersAction::Stats => commands::orders::stats(&ctx).await?,
        },
        Commands::Cashiers { action } => match action {
            CashiersAction::List => commands::cashiers::list(&ctx).await?,
            CashiersAction::Delete { id } => commands::cashiers::delete(&ctx, &id).await?,
        },
    }
    Ok(())
}

impl From<KindArg> for foodpoint_core::ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Product => Self::Product,
            KindArg::Deal => Self::Deal,
        }
    }
}
