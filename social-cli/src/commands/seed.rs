//! Demo data seeding command

use anyhow::{Context, Result};
use clap::Parser;
use social_store::seed::{seed, SeedPlan};
use social_store::{QueryContext, StoreConfig};

use crate::app::{print_json, App};

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Number of users to create (in one transaction)
    #[arg(long, default_value_t = 100)]
    pub users: usize,

    /// Number of posts, each by a random seeded user
    #[arg(long, default_value_t = 200)]
    pub posts: usize,

    /// Number of comments on random posts
    #[arg(long, default_value_t = 500)]
    pub comments: usize,

    /// Random follower edges to attempt
    #[arg(long, default_value_t = 0)]
    pub follows: usize,

    /// Seed for reproducible data
    #[arg(long, value_name = "SEED")]
    pub rng_seed: Option<u64>,

    /// Password given to every seeded user
    #[arg(long, env = "SEED_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl From<SeedArgs> for SeedPlan {
    fn from(args: SeedArgs) -> Self {
        SeedPlan {
            users: args.users,
            posts: args.posts,
            comments: args.comments,
            follows: args.follows,
            rng_seed: args.rng_seed,
            password: args.password,
        }
    }
}

pub async fn run_seed(args: SeedArgs, config: &StoreConfig, ctx: &QueryContext) -> Result<()> {
    let app = App::connect(config).await?;
    let report = seed(&app.storage, ctx, args.into())
        .await
        .context("Seeding failed")?;
    print_json(&report)
}
