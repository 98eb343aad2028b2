//! Shopfront CLI - Catalog and user management from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check the backend is reachable
//! shop-cli health
//!
//! # List products, optionally filtered
//! shop-cli products list --q shirt --stock out_of_stock
//!
//! # List users (needs admin credentials)
//! shop-cli users list --role admin
//!
//! # Delete a category, skipping the prompt
//! shop-cli categories delete 64f0c2 --yes
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Base URL of the shop backend REST API (required)
//! - `BACKEND_TIMEOUT_SECS` - Request timeout (default 10)
//! - `SHOP_API_TOKEN` - Admin bearer token, used as is when set
//! - `SHOP_ADMIN_EMAIL` / `SHOP_ADMIN_PASSWORD` - Admin credentials to log
//!   in with when no token is set

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "shop-cli")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend API is reachable
    Health,
    /// Browse and delete products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Browse and delete categories
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },
    /// Browse and delete users (admin credentials required)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Match against name and description
        #[arg(short, long)]
        q: Option<String>,

        /// Category ID
        #[arg(short, long)]
        category: Option<String>,

        /// `in_stock` or `out_of_stock`
        #[arg(short, long)]
        stock: Option<String>,
    },
    /// Delete a product
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CategoriesAction {
    /// List categories with their attribute definitions
    List {
        /// Match against the category name
        #[arg(short, long)]
        q: Option<String>,
    },
    /// Delete a category
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UsersAction {
    /// List users
    List {
        /// Match against name and email
        #[arg(short, long)]
        q: Option<String>,

        /// `customer` or `admin`
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Delete a user
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing; logs go to stderr so listings can be piped
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopfront_cli=info,shopfront_admin=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Health => commands::health::check(&ctx).await?,
        Commands::Products { action } => match action {
            ProductsAction::List { q, category, stock } => {
                commands::catalog::list_products(&ctx, q, category, stock).await?;
            }
            ProductsAction::Delete { id, yes } => {
                commands::catalog::delete_product(&ctx, &id, yes).await?;
            }
        },
        Commands::Categories { action } => match action {
            CategoriesAction::List { q } => commands::catalog::list_categories(&ctx, q).await?,
            CategoriesAction::Delete { id, yes } => {
                commands::catalog::delete_category(&ctx, &id, yes).await?;
            }
        },
        Commands::Users { action } => match action {
            UsersAction::List { q, role } => commands::users::list(&ctx, q, role).await?,
            UsersAction::Delete { id, yes } => commands::users::delete(&ctx, &id, yes).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_delete_takes_yes_flag() {
        let cli = Cli::try_parse_from(["shop-cli", "products", "delete", "p1", "--yes"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Products {
                action: ProductsAction::Delete { yes: true, .. }
            })
        ));
    }
}
