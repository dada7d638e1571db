//! ProgLearn CLI - Lesson import and seeding tools.
//!
//! # Usage
//!
//! ```bash
//! # Import lessons from a JSON array
//! proglearn import lessons.json --email admin@example.com
//!
//! # Add the demo C lesson
//! proglearn seed demo
//! ```
//!
//! # Commands
//!
//! - `import` - Create one lesson per entry of a JSON file
//! - `seed demo` - Create the demo lesson
//!
//! Both sign in as an admin first. Credentials come from `--email` and
//! `--password` or from `PROGLEARN_ADMIN_EMAIL` and `PROGLEARN_ADMIN_PASSWORD`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "proglearn")]
#[command(author, version, about = "ProgLearn CLI tools")]
struct Cli {
    #[command(flatten)]
    credentials: Credentials,

    #[command(subcommand)]
    command: Commands,
}

/// Admin account used for writes.
#[derive(Args)]
struct Credentials {
    /// Admin email address
    #[arg(short, long, global = true, env = "PROGLEARN_ADMIN_EMAIL")]
    email: Option<String>,

    /// Admin password
    #[arg(short, long, global = true, env = "PROGLEARN_ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import lessons from a JSON file
    Import {
        /// Path to a JSON array of lessons
        file: PathBuf,
    },
    /// Seed the backend with sample content
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create the demo C lesson
    Demo,
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

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
    let Credentials { email, password } = cli.credentials;
    let client =
        commands::auth::sign_in(email.as_deref(), password.map(SecretString::from)).await?;

    match cli.command {
        Commands::Import { file } => commands::import::from_file(&client, &file).await?,
        Commands::Seed { target } => match target {
            SeedTarget::Demo => commands::seed::demo(&client).await?,
        },
    }
    Ok(())
}
