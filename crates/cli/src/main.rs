//! IranMarket CLI - database migrations and store management.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront (shop schema) migrations
//! im-cli migrate storefront
//!
//! # Run admin schema migrations
//! im-cli migrate admin
//!
//! # Run both
//! im-cli migrate all
//!
//! # Create a staff account (password from IM_ADMIN_PASSWORD or a prompt)
//! im-cli admin create -e admin@iranmarket.ir -n "مدیر فروشگاه" -r super_admin
//!
//! # Import provinces and cities
//! im-cli load-locations --file data/iran_locations.json --reset
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "im-cli")]
#[command(author, version, about = "IranMarket CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Import provinces and cities from a JSON file
    LoadLocations {
        /// Path to the locations file
        #[arg(short, long, default_value = commands::locations::DEFAULT_FILE)]
        file: String,

        /// Delete every existing city and province first
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run admin database migrations
    Admin,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new staff account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,
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
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name, role } => {
                commands::admin::create_user(&email, &name, &role).await?;
            }
        },
        Commands::LoadLocations { file, reset } => {
            let counts = commands::locations::load(&file, reset).await?;
            #[allow(clippy::print_stdout)]
            {
                println!("{counts}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_locations_defaults() {
        let cli = Cli::try_parse_from(["im-cli", "load-locations"]).unwrap();
        let Commands::LoadLocations { file, reset } = cli.command else {
            panic!("expected load-locations");
        };
        assert_eq!(file, "data/iran_locations.json");
        assert!(!reset);
    }

    #[test]
    fn test_admin_create_default_role() {
        let cli = Cli::try_parse_from([
            "im-cli", "admin", "create", "-e", "a@iranmarket.ir", "-n", "Sara",
        ])
        .unwrap();
        let Commands::Admin {
            action: AdminAction::Create { role, .. },
        } = cli.command
        else {
            panic!("expected admin create");
        };
        assert_eq!(role, "admin");
    }
}
