//! # GeaRent Storefront CLI
//!
//! Drives the storefront pages and admin actions from a terminal. Every
//! command prints its view model as JSON.
//!
//! ## Usage
//! ```bash
//! storefront products --category bikes
//! storefront cart add 12 --quantity 2 --days 3
//! storefront login kim@example.com 'secret-pass'
//! storefront checkout --address 4 --start 2026-11-01
//! storefront admin dashboard
//! ```
//!
//! Failures print what the shopper would see (an alert message, or
//! `redirect to /login`) and exit with status 1.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use gearent_api::{NewAccount, ProductQuery};
use gearent_core::{Id, OrderStatus, PaymentMethod};
use storefront::config::StorefrontConfig;
use storefront::error::AppResult;
use storefront::pages::{self, CheckoutRequest};
use storefront::{init_tracing, AppState};

#[derive(Debug, Parser)]
#[command(name = "storefront", version, about = "GeaRent rental storefront")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "GEARENT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Categories and newest gear
    Home,
    /// Browse the catalog
    Products {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    /// One product with its reviews
    Product { id: String },
    #[command(subcommand)]
    Cart(CartCommand),
    Login { email: String, password: String },
    Logout,
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Your orders
    Orders,
    /// Cancel one of your orders
    Cancel { order_id: String },
    /// Place an order for everything in the cart and pay for it
    Checkout {
        #[arg(long)]
        address: Option<String>,
        /// First rental day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = MethodArg::Card)]
        method: MethodArg,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    List,
    Add {
        product_id: String,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
        #[arg(long, default_value_t = 1)]
        days: u32,
    },
    Remove { product_id: String },
    Clear,
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    Dashboard,
    Orders {
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    Products,
    Categories,
    /// Move an order to another status
    OrderStatus { order_id: String, status: OrderStatus },
    /// Show or hide a product on the storefront
    Publish {
        product_id: String,
        #[arg(long)]
        hide: bool,
    },
    /// Replace a product's image with a local file
    UploadImage { product_id: String, file: PathBuf },
    DeleteReview { review_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Card,
    BankTransfer,
    Cash,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Card => PaymentMethod::Card,
            MethodArg::BankTransfer => PaymentMethod::BankTransfer,
            MethodArg::Cash => PaymentMethod::Cash,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(state: &AppState, command: Command) -> AppResult<()> {
    match command {
        Command::Home => print_json(&pages::home(state).await?),
        Command::Products {
            category,
            search,
            page,
        } => {
            let query = ProductQuery {
                category,
                search,
                page,
                limit: None,
            };
            print_json(&pages::product_list(state, &query).await?)
        }
        Command::Product { id } => print_json(&pages::product_detail(state, &Id::new(id)).await?),

        Command::Cart(cart) => match cart {
            CartCommand::List => print_json(&pages::cart_page(state).await?),
            CartCommand::Add {
                product_id,
                quantity,
                days,
            } => {
                let added =
                    pages::add_to_cart_by_id(state, &Id::new(product_id), quantity, days).await?;
                if !added {
                    println!("Already in your cart");
                }
                print_json(&pages::cart_page(state).await?)
            }
            CartCommand::Remove { product_id } => {
                pages::remove_from_cart(state, &Id::new(product_id)).await?;
                print_json(&pages::cart_page(state).await?)
            }
            CartCommand::Clear => pages::clear_cart(state).await,
        },

        Command::Login { email, password } => {
            let user = pages::login(state, &email, &password).await?;
            print_json(&user)
        }
        Command::Logout => pages::logout(state).await,
        Command::Register {
            email,
            password,
            name,
            phone,
        } => {
            let account = NewAccount {
                email,
                password,
                name,
                phone,
            };
            let registration = pages::register(state, &account).await?;
            print_json(&registration.user)
        }
        Command::Orders => print_json(&pages::my_orders(state).await?),
        Command::Cancel { order_id } => {
            print_json(&pages::cancel_order(state, &Id::new(order_id)).await?)
        }
        Command::Checkout {
            address,
            start,
            method,
        } => {
            let request = CheckoutRequest {
                address_id: address.map(Id::new),
                rental_start: start,
                method: method.into(),
            };
            print_json(&pages::checkout(state, &request).await?)
        }

        Command::Admin(admin) => run_admin(state, admin).await,
    }
}

async fn run_admin(state: &AppState, command: AdminCommand) -> AppResult<()> {
    let actions = state.actions();
    match command {
        AdminCommand::Dashboard => print_json(&pages::admin_dashboard(state).await?),
        AdminCommand::Orders { status } => print_json(&pages::admin_orders(state, status).await?),
        AdminCommand::Products => print_json(&pages::admin_products(state).await?),
        AdminCommand::Categories => print_json(&pages::admin_categories(state).await?),
        AdminCommand::OrderStatus { order_id, status } => {
            print_json(&actions.update_order_status(&Id::new(order_id), status).await?)
        }
        AdminCommand::Publish { product_id, hide } => {
            print_json(&actions.set_product_active(&Id::new(product_id), !hide).await?)
        }
        AdminCommand::UploadImage { product_id, file } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            print_json(
                &actions
                    .upload_product_image(&Id::new(product_id), &file_name, &bytes)
                    .await?,
            )
        }
        AdminCommand::DeleteReview { review_id } => {
            print_json(&actions.delete_review(&Id::new(review_id)).await?)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = StorefrontConfig::load(cli.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.log_level);
    debug!(command = ?cli.command, "Starting");

    let state = match AppState::open(config).await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e.outcome());
            return Err(e).context("opening the storefront");
        }
    };

    let result = run(&state, cli.command).await;
    state.db.close().await;

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e.outcome());
            Ok(ExitCode::FAILURE)
        }
    }
}
