//! CLI administration tool for Linkly.
//!
//! Provides commands for inspecting and retiring links, viewing statistics,
//! verifying accounts and checking the database without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Inspect a link by short code
//! cargo run --bin admin -- link show my-link
//!
//! # Retire a link immediately, regardless of its expiration policy
//! cargo run --bin admin -- link expire my-link
//!
//! # Delete a link and its click history
//! cargo run --bin admin -- link delete my-link --yes
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Mark an account verified when the email never arrived
//! cargo run --bin admin -- user verify ada@example.com
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `BASE_URL` (optional): used when printing short links

use linkly::application::services::{AnalyticsService, LinkService, UserService};
use linkly::domain::entities::Link;
use linkly::infrastructure::mail::LogMailer;
use linkly::infrastructure::persistence::{PgLinkRepository, PgUserRepository};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing Linkly.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and manage links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Show statistics
    Stats,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show a link and its expiration state
    Show {
        /// Short code or alias
        code: String,
    },

    /// Mark a link expired now
    Expire {
        /// Short code or alias
        code: String,
    },

    /// Delete a link permanently
    Delete {
        /// Short code or alias
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Mark an account verified without the emailed token
    Verify {
        /// Account email
        email: String,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let base_url =
        std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    let pool = Arc::new(pool);

    match cli.command {
        Commands::Link { action } => handle_link_action(action, pool, &base_url).await?,
        Commands::Stats => handle_stats(pool, &base_url).await?,
        Commands::User { action } => handle_user_action(action, pool, &base_url).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn link_service(pool: Arc<PgPool>, base_url: &str) -> LinkService<PgLinkRepository> {
    LinkService::new(Arc::new(PgLinkRepository::new(pool)), base_url, 1)
}

/// Dispatches link commands.
async fn handle_link_action(action: LinkAction, pool: Arc<PgPool>, base_url: &str) -> Result<()> {
    let service = link_service(pool, base_url);

    match action {
        LinkAction::Show { code } => {
            let link = service
                .get_by_code(&code)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_link(&link);
        }
        LinkAction::Expire { code } => {
            let link = service
                .expire_now(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to expire link: {}", e))?;

            println!(
                "{} {}",
                "✅ Link expired:".green().bold(),
                link.full_short_url.cyan()
            );
        }
        LinkAction::Delete { code, yes } => {
            let link = service
                .get_by_code(&code)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            print_link(&link);

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Delete this link and its click history?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            service
                .delete_by_code(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to delete link: {}", e))?;

            println!("{}", "✅ Link deleted".green().bold());
        }
    }

    Ok(())
}

fn print_link(link: &Link) {
    let status = if link.is_expired_at(Utc::now()) {
        "EXPIRED".red()
    } else {
        "ACTIVE".green()
    };

    println!("{}", "🔗 Link".bright_blue().bold());
    println!();
    println!("  Short URL:   {}", link.full_short_url.cyan());
    println!("  Destination: {}", link.original_url.bright_white());
    println!("  Session:     {}", link.session_id.bright_black());
    println!("  Source:      {}", link.source.as_str());
    println!("  Clicks:      {}", link.total_clicks.to_string().bold());
    println!("  Expiration:  {}", link.expiration.kind().as_str());
    if let Some(at) = link.expiration.expires_at() {
        println!("  Expires at:  {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    if let Some(n) = link.expiration.expire_after_clicks() {
        println!("  Click limit: {}", n);
    }
    println!("  Status:      {}", status);
    println!(
        "  Created:     {}",
        link.created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );
    println!();
}

/// Displays system statistics.
///
/// Shows:
/// - Total and active links
/// - Total number of clicks
/// - Number of registered users
async fn handle_stats(pool: Arc<PgPool>, base_url: &str) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let analytics = AnalyticsService::new(Arc::new(PgLinkRepository::new(pool.clone())));
    let totals = analytics
        .totals()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load totals: {}", e))?;

    let users = user_service(pool, base_url)
        .count()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to count users: {}", e))?;

    println!(
        "  Links:        {}",
        totals.links.to_string().bright_green().bold()
    );
    println!(
        "  Active links: {}",
        totals.active_links.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:       {}",
        totals.clicks.to_string().bright_green().bold()
    );
    println!("  Users:        {}", users.to_string().bright_green().bold());
    println!();

    Ok(())
}

fn user_service(pool: Arc<PgPool>, base_url: &str) -> UserService<PgUserRepository> {
    // Only operator actions run here; no session tokens are issued.
    let secret = std::env::var("JWT_SECRET").unwrap_or_default();
    UserService::new(
        Arc::new(PgUserRepository::new(pool)),
        Arc::new(LogMailer),
        secret,
        1,
        base_url,
    )
}

async fn handle_user_action(action: UserAction, pool: Arc<PgPool>, base_url: &str) -> Result<()> {
    match action {
        UserAction::Verify { email } => {
            let user = user_service(pool, base_url)
                .force_verify(&email)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            println!(
                "{} {} <{}>",
                "✅ Verified".green().bold(),
                user.first_name.cyan(),
                user.email
            );
        }
    }

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
