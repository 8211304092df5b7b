//! cartsync CLI - drive the cart controller from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! cartsync products
//!
//! # Create a cart and add two units of a product
//! cartsync cart add prod_123 -q 2
//!
//! # Keep working on the same cart
//! cartsync --cart cart_abc cart update item_456 5
//! cartsync --cart cart_abc cart empty
//!
//! # Capture a checkout with customer details from a YAML file
//! cartsync --cart cart_abc checkout capture chkt_789 --payload order.yaml
//!
//! # Theme preference
//! cartsync theme toggle
//! ```
//!
//! # Commands
//!
//! - `products` - List the catalog
//! - `cart` - Show, add, update, remove, empty, refresh
//! - `checkout capture` - Capture a checkout for the cart
//! - `theme` - Show or toggle the persisted theme flag

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cartsync")]
#[command(author, version, about = "cartsync CLI tools")]
struct Cli {
    /// Cart to resume (a new cart is created when omitted)
    #[arg(long, global = true)]
    cart: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the catalog
    Products,
    /// Work with the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Capture checkouts
    Checkout {
        #[command(subcommand)]
        action: CheckoutAction,
    },
    /// Manage the theme preference
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product id
        product_id: String,

        /// Units to add
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a line item (0 removes it)
    Update {
        /// Line item id
        line_item_id: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line item
    Remove {
        /// Line item id
        line_item_id: String,
    },
    /// Remove every line item
    Empty,
    /// Re-read the cart from the store
    Refresh,
}

#[derive(Subcommand)]
enum CheckoutAction {
    /// Capture a checkout for every line of the cart
    Capture {
        /// Checkout token issued by the store
        token: String,

        /// YAML file with customer, shipping, fulfillment and payment
        #[arg(short, long)]
        payload: String,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show the current theme
    Show,
    /// Switch between light and dark
    Toggle,
}

#[tokio::main]
async fn main() {
    // Initialize tracing (command output goes through it)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartsync=info,cartsync_storefront=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cart = cli.cart;
    match cli.command {
        Commands::Products => commands::catalog::list().await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(cart).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => commands::cart::add(cart, product_id, quantity).await?,
            CartAction::Update {
                line_item_id,
                quantity,
            } => commands::cart::update(cart, line_item_id, quantity).await?,
            CartAction::Remove { line_item_id } => {
                commands::cart::remove(cart, line_item_id).await?;
            }
            CartAction::Empty => commands::cart::empty(cart).await?,
            CartAction::Refresh => commands::cart::refresh(cart).await?,
        },
        Commands::Checkout { action } => match action {
            CheckoutAction::Capture { token, payload } => {
                commands::checkout::capture(cart, &token, &payload).await?;
            }
        },
        Commands::Theme { action } => match action {
            ThemeAction::Show => commands::theme::show().await?,
            ThemeAction::Toggle => commands::theme::toggle().await?,
        },
    }
    Ok(())
}
