use anyhow::{Context, Result};
use clap::Parser;
use social_store::{FeedQueryParams, QueryContext, StoreConfig};

use crate::app::{print_json, App};

#[derive(Parser, Debug)]
pub struct FeedArgs {
    /// User whose feed to show
    pub user_id: i64,

    /// Posts per page (1-20)
    #[arg(long)]
    pub limit: Option<String>,

    /// Posts to skip
    #[arg(long)]
    pub offset: Option<String>,

    /// asc or desc (default: desc, newest first)
    #[arg(long)]
    pub sort: Option<String>,

    /// Case-insensitive text to find in title or content
    #[arg(long)]
    pub search: Option<String>,

    /// Comma-separated tags; a post matches if it has any of them
    #[arg(long)]
    pub tags: Option<String>,

    /// Only posts created at or after this RFC 3339 time
    #[arg(long)]
    pub since: Option<String>,

    /// Only posts created at or before this RFC 3339 time
    #[arg(long)]
    pub until: Option<String>,
}

impl FeedArgs {
    fn params(&self) -> FeedQueryParams {
        FeedQueryParams {
            limit: self.limit.clone(),
            offset: self.offset.clone(),
            sort: self.sort.clone(),
            search: self.search.clone(),
            tags: self.tags.clone(),
            since: self.since.clone(),
            until: self.until.clone(),
        }
    }
}

pub async fn run_feed(args: FeedArgs, config: &StoreConfig, ctx: &QueryContext) -> Result<()> {
    // Validate before touching the database
    let query = args.params().parse().context("Invalid feed parameters")?;

    let app = App::connect(config).await?;
    let feed = app
        .storage
        .posts
        .get_user_feed(ctx, args.user_id, &query)
        .await
        .with_context(|| format!("Failed to load feed for user {}", args.user_id))?;
    print_json(&feed)
}
