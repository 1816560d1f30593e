//! Loyalty CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! loyalty-cli migrate
//!
//! # Create a staff or admin user
//! loyalty-cli user create -e admin@example.com --first-name Ada --last-name Ops -r admin
//!
//! # Insert demo stores, services, products and promotions
//! loyalty-cli seed
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "loyalty-cli")]
#[command(author, version, about = "Loyalty API CLI tools")]
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
    /// Insert demo data
    Seed,
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user with a linked customer record
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(long)]
        first_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        /// Role (`customer`, `staff`, `manager`, `admin`)
        #[arg(short, long, default_value = "staff")]
        role: String,

        /// Password; read from `LOYALTY_USER_PASSWORD` when omitted
        #[arg(long)]
        password: Option<String>,
    },
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

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                first_name,
                last_name,
                role,
                password,
            } => {
                commands::user::create(commands::user::NewUserArgs {
                    email,
                    first_name,
                    last_name,
                    role,
                    password,
                })
                .await?;
            }
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "loyalty-cli",
            "user",
            "create",
            "-e",
            "ops@example.com",
            "--first-name",
            "Ada",
            "--last-name",
            "Ops",
            "-r",
            "admin",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::User {
                action: UserAction::Create { password: None, .. }
            })
        ));
    }
}
