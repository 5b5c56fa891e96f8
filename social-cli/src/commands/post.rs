use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use social_store::{QueryContext, StoreConfig};

use crate::app::{print_json, App};

#[derive(Parser, Debug)]
pub struct PostArgs {
    #[command(subcommand)]
    pub command: PostCommand,
}

#[derive(Subcommand, Debug)]
pub enum PostCommand {
    /// Show a post with its comments, oldest first
    Get {
        /// Post ID
        id: i64,
    },
    /// Delete a post and its comments
    Delete {
        /// Post ID
        id: i64,
    },
}

pub async fn run_post(args: PostArgs, config: &StoreConfig, ctx: &QueryContext) -> Result<()> {
    let app = App::connect(config).await?;

    match args.command {
        PostCommand::Get { id } => {
            let mut post = app
                .storage
                .posts
                .get_by_id(ctx, id)
                .await
                .with_context(|| format!("Failed to load post {id}"))?;
            post.comments = app
                .storage
                .comments
                .get_by_post_id(ctx, id)
                .await
                .with_context(|| format!("Failed to load comments for post {id}"))?;
            print_json(&post)
        }
        PostCommand::Delete { id } => {
            app.storage
                .posts
                .delete_by_id(ctx, id)
                .await
                .with_context(|| format!("Failed to delete post {id}"))?;
            println!("post {id} deleted");
            Ok(())
        }
    }
}
