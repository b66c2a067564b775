//! Vexaparts CLI - drive the storefront against a directory-backed store.
//!
//! # Usage
//!
//! ```bash
//! # Resolve the product list (cache, admin edits or source)
//! vexa --source https://shop.example/products.json products load
//!
//! # Filter the catalog
//! vexa products list --category gpu --sort price-asc
//!
//! # Fill the cart and check out
//! vexa cart add 1700000000000
//! vexa orders place --first-name Sanne --last-name "de Vries" --email sanne@example.nl \
//!     --street "Kerkstraat 1" --postal-code "1234 AB" --city Utrecht
//!
//! # Edit the product list (saved immediately)
//! vexa admin edit 1700000000000 --price 549.00
//! ```
//!
//! # Commands
//!
//! - `products` - Load, refresh, reset, clear, show and list products
//! - `cart` - Add, remove, set quantity, clear and show the cart
//! - `admin` - Add, edit, delete and list products in the admin copy
//! - `orders` - Place and list orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vexaparts_core::{Category, ProductId};
use vexaparts_storefront::{Storefront, StorefrontConfig};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "vexa")]
#[command(author, version, about = "Vexaparts storefront CLI")]
struct Cli {
    /// Directory of the local store (overrides `VEXAPARTS_STORAGE_DIR`)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    /// Product source location, URL or path; repeat for fallbacks
    /// (overrides `VEXAPARTS_SOURCE_LOCATIONS`)
    #[arg(long = "source", global = true)]
    sources: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "VEXAPARTS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Product cache operations and catalog queries
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Admin product editing
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Resolve products from admin edits, a fresh cache or the source
    Load,
    /// Fetch the source regardless of cache state
    Refresh,
    /// Discard admin edits and cached products, then fetch the source
    Reset,
    /// Remove all storefront data (products, cart, orders)
    Clear,
    /// Show one product
    Show {
        /// Product ID
        id: ProductId,
    },
    /// List the catalog
    List {
        /// Only products of this category
        #[arg(short, long)]
        category: Option<Category>,

        /// Search term matched against names and specifications
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order (`name-asc`, `name-desc`, `price-asc`, `price-desc`)
        #[arg(long, default_value = "name-asc")]
        sort: String,
    },

    /// Show the best sellers
    Featured,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add {
        /// Product ID
        id: ProductId,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        id: ProductId,
    },
    /// Set the quantity of a cart line (0 removes it)
    Set {
        /// Product ID
        id: ProductId,
        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Show the cart and its totals
    Show,
}

/// Product form fields shared by `admin add` and `admin edit`.
#[derive(clap::Args)]
struct ProductFields {
    /// Product name
    #[arg(short, long)]
    name: Option<String>,

    /// Category (`cpu`, `gpu`, `memory`, `storage`, `motherboard`, `psu`, `cooling`, `other`)
    #[arg(short, long)]
    category: Option<Category>,

    /// Price in euros
    #[arg(short, long)]
    price: Option<Decimal>,

    /// Image URL
    #[arg(short, long)]
    image: Option<String>,

    /// Description
    #[arg(short, long)]
    description: Option<String>,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Add a product and save
    Add {
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Edit a product and save; omitted fields keep their value
    Edit {
        /// Product ID
        id: ProductId,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product and save
    Delete {
        /// Product ID
        id: ProductId,
    },
    /// List the admin working copy
    List,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Place an order for the current cart
    Place {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        street: String,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "Nederland")]
        country: String,
        /// Payment method (`ideal`, `creditcard`, `paypal`)
        #[arg(long, default_value = "ideal")]
        payment_method: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List orders, newest first
    List {
        /// Filter by order number or item name
        #[arg(short, long)]
        search: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
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

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vexaparts_storefront=info,vexaparts_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Load configuration, letting command-line flags win over the environment.
fn load_config(cli: &Cli) -> Result<StorefrontConfig, vexaparts_storefront::config::ConfigError> {
    let storage_dir = cli
        .storage_dir
        .as_ref()
        .map(|dir| dir.display().to_string());
    let sources = (!cli.sources.is_empty()).then(|| cli.sources.join(","));

    StorefrontConfig::from_lookup(|key| match key {
        "VEXAPARTS_STORAGE_DIR" if storage_dir.is_some() => storage_dir.clone(),
        "VEXAPARTS_SOURCE_LOCATIONS" if sources.is_some() => sources.clone(),
        _ => std::env::var(key).ok(),
    })
}

#[tokio::main]
async fn main() {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.log_json);
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    let storefront = Storefront::new(config);
    if let Err(e) = run(cli.command, &storefront).await {
        e.report();
        std::process::exit(1);
    }
}

async fn run(command: Commands, storefront: &Storefront) -> vexaparts_storefront::error::Result<()> {
    match command {
        Commands::Products { action } => match action {
            ProductsAction::Load => commands::products::load(storefront).await,
            ProductsAction::Refresh => commands::products::refresh(storefront).await,
            ProductsAction::Reset => commands::products::reset(storefront).await,
            ProductsAction::Clear => commands::products::clear(storefront).await?,
            ProductsAction::Show { id } => commands::products::show(storefront, id).await?,
            ProductsAction::List {
                category,
                search,
                sort,
            } => commands::products::list(storefront, category, search, &sort).await,
            ProductsAction::Featured => commands::products::featured(storefront).await,
        },
        Commands::Cart { action } => match action {
            CartAction::Add { id } => commands::cart::add(storefront, id).await?,
            CartAction::Remove { id } => commands::cart::remove(storefront, id).await?,
            CartAction::Set { id, quantity } => {
                commands::cart::set(storefront, id, quantity).await?;
            }
            CartAction::Clear => commands::cart::clear(storefront).await?,
            CartAction::Show => commands::cart::show(storefront).await,
        },
        Commands::Admin { action } => match action {
            AdminAction::Add { fields } => commands::admin::add(storefront, fields.into()).await?,
            AdminAction::Edit { id, fields } => {
                commands::admin::edit(storefront, id, fields.into()).await?;
            }
            AdminAction::Delete { id } => commands::admin::delete(storefront, id).await?,
            AdminAction::List => commands::admin::list(storefront).await,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Place {
                first_name,
                last_name,
                email,
                phone,
                street,
                postal_code,
                city,
                country,
                payment_method,
                notes,
            } => {
                let checkout = commands::orders::checkout(
                    vexaparts_core::Customer {
                        first_name,
                        last_name,
                        email,
                        phone,
                        address: vexaparts_core::Address {
                            street,
                            postal_code,
                            city,
                            country,
                        },
                    },
                    payment_method,
                    notes,
                );
                commands::orders::place(storefront, checkout).await?;
            }
            OrdersAction::List { search } => {
                commands::orders::list(storefront, search.as_deref()).await;
            }
        },
    }
    Ok(())
}

impl From<ProductFields> for commands::admin::ProductEdit {
    fn from(fields: ProductFields) -> Self {
        Self {
            name: fields.name,
            category: fields.category,
            price: fields.price,
            image: fields.image,
            description: fields.description,
        }
    }
}
