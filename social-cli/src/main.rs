//! social CLI - operate the social network's persistence layer
//!
//! Provides:
//! - Schema migrations (`migrate`)
//! - Demo data (`seed`)
//! - User, post, follower and feed operations against Postgres
//! - Connectivity checks (`health`)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use social_store::QueryContext;

mod app;
mod commands;
mod config;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "social",
    author,
    version,
    about = "Persistence tooling for the social network",
    long_about = "Run migrations, seed demo data and inspect or modify users, posts, \
                  follower edges and feeds in the social network's Postgres store."
)]
struct Cli {
    /// TOML config file (values are overridden by the environment)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Database URL (overrides config and DB_ADDR)
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Bypass the Redis user cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update the database schema
    Migrate,
    /// Fill the database with demo users, posts and comments
    Seed(commands::seed::SeedArgs),
    /// User operations (get, invite, activate, delete)
    User(commands::user::UserArgs),
    /// Show a user's feed
    Feed(commands::feed::FeedArgs),
    /// Follow a user
    Follow(commands::follow::FollowArgs),
    /// Unfollow a user
    Unfollow(commands::follow::FollowArgs),
    /// Post operations (get, delete)
    Post(commands::post::PostArgs),
    /// Check database and cache connectivity
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    let config = config::load(
        cli.config.as_deref(),
        config::Overrides {
            database_url: cli.database_url,
            no_cache: cli.no_cache,
        },
    )?;

    let ctx = QueryContext::new(config.query_timeout);
    let on_interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling in-flight queries");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Migrate => commands::run_migrate(&config).await?,
        Commands::Seed(args) => commands::run_seed(args, &config, &ctx).await?,
        Commands::User(args) => commands::run_user(args, &config, &ctx).await?,
        Commands::Feed(args) => commands::run_feed(args, &config, &ctx).await?,
        Commands::Follow(args) => commands::run_follow(args, &config, &ctx).await?,
        Commands::Unfollow(args) => commands::run_unfollow(args, &config, &ctx).await?,
        Commands::Post(args) => commands::run_post(args, &config, &ctx).await?,
        Commands::Health => commands::run_health(&config, &ctx).await?,
    }
    Ok(())
}
