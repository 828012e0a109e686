//! Emporium CLI - Database migrations, catalog seeding and customer tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront database migrations
//! emp-cli migrate
//!
//! # Load shipping and payment methods
//! emp-cli seed catalog
//!
//! # Load sample products from a custom file
//! emp-cli seed products --file my-products.yaml
//!
//! # Everything at once
//! emp-cli seed all
//!
//! # Create a customer
//! emp-cli user create -e ayse@example.com -n "Ayse Yilmaz"
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emp-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Load seed data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage customers
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Shipping and payment methods (updated in place by name)
    Catalog {
        /// YAML file to load instead of the bundled catalog
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Sample products (existing names are skipped)
    Products {
        /// YAML file to load instead of the bundled products
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Bundled catalog and products
    All,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new customer
    Create {
        /// Customer email address
        #[arg(short, long)]
        email: String,

        /// Customer display name
        #[arg(short, long, default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(file.as_deref()).await?,
            SeedTarget::Products { file } => commands::seed::products(file.as_deref()).await?,
            SeedTarget::All => {
                commands::seed::catalog(None).await?;
                commands::seed::products(None).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::Create { email, name } => {
                commands::user::create(&email, &name).await?;
            }
        },
    }
    Ok(())
}
