//! Tripmate CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! tm-cli migrate
//!
//! # Create the first admin
//! tm-cli user create -u admin -p 'S3cure-pass' -t Admin
//!
//! # Load demo data owned by that admin
//! tm-cli seed crates/cli/seed/demo.yaml --owner admin
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create` - Create accepted users of any type
//! - `seed` - Insert tags, museums and products from YAML

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tm-cli")]
#[command(author, version, about = "Tripmate CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database from a YAML file
    Seed {
        /// Path to the seed file
        file: String,

        /// Username or email of the user who owns seeded records
        #[arg(short, long, default_value = "admin")]
        owner: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new accepted user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password (at least 8 characters with a digit)
        #[arg(short, long)]
        password: String,

        /// Account type (`Tourist`, `Advertiser`, `Seller`, `TourGuide`, `TourismGovernor`, `Admin`)
        #[arg(short = 't', long, default_value = "Admin")]
        account_type: String,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                password,
                account_type,
                email,
            } => {
                commands::user::create(&username, &password, &account_type, email).await?;
            }
        },
        Commands::Seed { file, owner } => commands::seed::run(&file, &owner).await?,
    }
    Ok(())
}
