use anyhow::{Context, Result};
use social_store::db::migrations;
use social_store::StoreConfig;

use crate::app::App;

pub async fn run_migrate(config: &StoreConfig) -> Result<()> {
    let app = App::connect(config).await?;
    migrations::run(&app.pool)
        .await
        .context("Failed to run migrations")?;
    println!("migrations applied");
    Ok(())
}
