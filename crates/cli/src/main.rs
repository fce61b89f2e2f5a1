//! Aura CLI - command-line storefront shell.
//!
//! A thin UI layer over `aura-client`: every command constructs the state
//! containers (session, cart, checkout), runs one operation, and prints the
//! result. Durable state lives in the data directory, so the cart and
//! session survive between invocations.
//!
//! # Usage
//!
//! ```bash
//! # Log in (developer shortcut; requires the backend's dev mode)
//! aura login --dev --admin
//!
//! # Browse the catalog
//! aura products --category t-shirt --color black
//!
//! # Build a cart
//! aura cart add 3 --quantity 2
//! aura cart show
//!
//! # Place the order
//! aura checkout --name "Asha Rao" --email asha@example.com \
//!     --phone 9876543210 --address "12 MG Road" \
//!     --city Bengaluru --state Karnataka --postal-code 560001
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::Shell;

#[derive(Parser)]
#[command(name = "aura")]
#[command(author, version, about = "Aura Fashions storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the storefront
    Login {
        /// Provider ID token (prompted for if omitted)
        #[arg(long, conflicts_with = "dev")]
        token: Option<String>,

        /// Use the backend-gated developer login instead of a provider
        #[arg(long)]
        dev: bool,

        /// Display name for the developer login
        #[arg(long, requires = "dev")]
        name: Option<String>,

        /// Email for the developer login
        #[arg(long, requires = "dev")]
        email: Option<String>,

        /// Request an admin role with the developer login
        #[arg(long, requires = "dev")]
        admin: bool,
    },
    /// Log out and discard local credentials
    Logout,
    /// Show the current user
    Whoami,
    /// List catalog products
    Products {
        /// Filter by category (t-shirt, hoodie)
        #[arg(long)]
        category: Option<String>,

        /// Filter by color
        #[arg(long)]
        color: Option<String>,

        /// Filter by size
        #[arg(long)]
        size: Option<String>,
    },
    /// Show a single product
    Product {
        /// Product ID
        id: i32,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order from the current cart
    Checkout {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        state: String,
        #[arg(long)]
        postal_code: String,
    },
    /// List your orders
    Orders,
    /// Show a single order
    Order {
        /// Order ID
        id: i32,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart
    Add {
        /// Product ID
        product_id: i32,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity of a cart line (0 removes it)
    Update {
        product_id: i32,
        size: String,
        color: String,
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        product_id: i32,
        size: String,
        color: String,
    },
    /// Show the cart
    Show,
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> aura_client::error::Result<()> {
    let mut shell = Shell::init().await?;

    let result = dispatch(&mut shell, cli.command).await;

    // Any authorization rejection, wherever it surfaced, takes the forced
    // logout path exactly once
    if let Err(e) = &result
        && e.is_auth_rejection()
    {
        shell.session.handle_auth_rejection();
        tracing::warn!("Session expired, please log in again");
    }

    result
}

async fn dispatch(shell: &mut Shell, command: Commands) -> aura_client::error::Result<()> {
    match command {
        Commands::Login {
            token,
            dev,
            name,
            email,
            admin,
        } => {
            if dev {
                commands::session::login_dev(shell, name, email, admin).await
            } else {
                commands::session::login_provider(shell, token).await
            }
        }
        Commands::Logout => commands::session::logout(shell),
        Commands::Whoami => commands::session::whoami(shell),
        Commands::Products {
            category,
            color,
            size,
        } => commands::shop::list_products(shell, category, color, size).await,
        Commands::Product { id } => commands::shop::show_product(shell, id).await,
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(shell, product_id, quantity).await,
            CartAction::Update {
                product_id,
                size,
                color,
                quantity,
            } => commands::cart::update(shell, product_id, &size, &color, quantity),
            CartAction::Remove {
                product_id,
                size,
                color,
            } => commands::cart::remove(shell, product_id, &size, &color),
            CartAction::Show => commands::cart::show(shell),
            CartAction::Clear => commands::cart::clear(shell),
        },
        Commands::Checkout {
            name,
            email,
            phone,
            address,
            city,
            state,
            postal_code,
        } => {
            let form = aura_client::checkout::ShippingForm {
                name,
                email,
                phone,
                address,
                city,
                state,
                postal_code,
            };
            commands::shop::checkout(shell, &form).await
        }
        Commands::Orders => commands::shop::list_orders(shell).await,
        Commands::Order { id } => commands::shop::show_order(shell, id).await,
    }
}
