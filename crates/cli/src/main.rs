//! Bistro CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bistro migrate
//!
//! # Create a staff account (password from BISTRO_ADMIN_PASSWORD)
//! bistro admin create -u maria -e maria@bistro.com -n "Maria Lopez" -r super_admin
//!
//! # Insert default settings rows that are missing
//! bistro settings seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create staff accounts
//! - `settings seed` - Seed the settings table

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bistro")]
#[command(author, version, about = "Bistro admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new staff account
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`editor`, `admin`, `super_admin`)
        #[arg(short, long, default_value = "editor")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Insert the default row for every known setting that is missing
    Seed,
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                name,
                role,
            } => {
                commands::admin::create_user(&username, &email, &name, &role).await?;
            }
        },
        Commands::Settings { action } => match action {
            SettingsAction::Seed => {
                commands::settings::seed().await?;
            }
        },
    }
    Ok(())
}
