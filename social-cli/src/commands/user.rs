//! User commands: cache-aside lookup, invitation flow, deletion

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use social_store::{lookup_user, Password, QueryContext, StoreConfig, User};
use uuid::Uuid;

use crate::app::{print_json, user_cache, App};

#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Show an active user (served from the cache when possible)
    Get {
        /// User ID
        id: i64,
    },
    /// Create an inactive user and print its activation token
    Invite {
        /// Unique username
        username: String,
        /// Unique email address
        email: String,
        /// Initial password
        #[arg(long, env = "SOCIAL_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Activate the user an invitation token belongs to
    Activate {
        /// Plain token as printed by `user invite`
        token: String,
    },
    /// Delete a user and everything they own
    Delete {
        /// User ID
        id: i64,
    },
}

#[derive(Debug, Serialize)]
struct Invitation<'a> {
    user: &'a User,
    token: &'a str,
    expires_in: String,
}

pub async fn run_user(args: UserArgs, config: &StoreConfig, ctx: &QueryContext) -> Result<()> {
    let app = App::connect(config).await?;

    match args.command {
        UserCommand::Get { id } => {
            let cache = user_cache(config, ctx).await;
            let user = lookup_user(app.storage.users.as_ref(), cache.as_ref(), ctx, id)
                .await
                .with_context(|| format!("Failed to load user {id}"))?;
            print_json(&user)
        }
        UserCommand::Invite {
            username,
            email,
            password,
        } => {
            let mut user = User::new(username, email);
            if let Some(password) = password.as_deref() {
                user.password = Password::hashed(password).context("Failed to hash password")?;
            }
            let token = Uuid::new_v4().to_string();
            app.storage
                .users
                .create_and_invite(ctx, &mut user, &token, config.invitation_ttl)
                .await
                .context("Failed to invite user")?;

            tracing::info!(user_id = user.id, "invitation created");
            print_json(&Invitation {
                user: &user,
                token: &token,
                expires_in: format!("{:?}", config.invitation_ttl),
            })
        }
        UserCommand::Activate { token } => {
            app.storage
                .users
                .activate(ctx, &token)
                .await
                .context("Failed to activate user")?;
            println!("user activated");
            Ok(())
        }
        UserCommand::Delete { id } => {
            app.storage
                .users
                .delete(ctx, id)
                .await
                .with_context(|| format!("Failed to delete user {id}"))?;
            println!("user {id} deleted");
            Ok(())
        }
    }
}
