use anyhow::{Context, Result};
use clap::Parser;
use social_store::{QueryContext, StoreConfig};

use crate::app::App;

#[derive(Parser, Debug)]
pub struct FollowArgs {
    /// ID of the user who follows
    pub follower_id: i64,

    /// ID of the user being followed
    pub followed_id: i64,
}

pub async fn run_follow(args: FollowArgs, config: &StoreConfig, ctx: &QueryContext) -> Result<()> {
    let app = App::connect(config).await?;
    app.storage
        .followers
        .follow(ctx, args.follower_id, args.followed_id)
        .await
        .with_context(|| {
            format!(
                "User {} could not follow user {}",
                args.follower_id, args.followed_id
            )
        })?;
    println!("{} now follows {}", args.follower_id, args.followed_id);
    Ok(())
}

pub async fn run_unfollow(
    args: FollowArgs,
    config: &StoreConfig,
    ctx: &QueryContext,
) -> Result<()> {
    let app = App::connect(config).await?;
    app.storage
        .followers
        .unfollow(ctx, args.follower_id, args.followed_id)
        .await
        .context("Failed to unfollow")?;
    println!("{} no longer follows {}", args.follower_id, args.followed_id);
    Ok(())
}
