//! Schema migrations
//!
//! Every statement is idempotent, so `run` is safe on every startup.

use sqlx::PgPool;

use crate::error::Result;
use crate::models::Role;

/// Statements in dependency order.
const SCHEMA: &[(&str, &str)] = &[
    (
        "roles",
        r#"
        CREATE TABLE IF NOT EXISTS roles (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            level INT NOT NULL DEFAULT 0,
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    ),
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            password TEXT,
            is_active BOOLEAN NOT NULL DEFAULT FALSE,
            role_id BIGINT NOT NULL REFERENCES roles(id),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT users_username_key UNIQUE (username),
            CONSTRAINT users_email_key UNIQUE (email)
        )
        "#,
    ),
    (
        "user_invitations",
        r#"
        CREATE TABLE IF NOT EXISTS user_invitations (
            token TEXT NOT NULL,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expiry TIMESTAMPTZ NOT NULL,
            CONSTRAINT user_invitations_pkey PRIMARY KEY (token)
        )
        "#,
    ),
    (
        "posts",
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id BIGSERIAL PRIMARY KEY,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            tags TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "comments",
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id BIGSERIAL PRIMARY KEY,
            post_id BIGINT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    ),
    (
        "followers",
        r#"
        CREATE TABLE IF NOT EXISTS followers (
            user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            follower_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT followers_pkey PRIMARY KEY (user_id, follower_id)
        )
        "#,
    ),
    (
        "indexes",
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_tags ON posts USING GIN (tags);
        CREATE INDEX IF NOT EXISTS idx_posts_user_created ON posts (user_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id);
        CREATE INDEX IF NOT EXISTS idx_followers_follower ON followers (follower_id);
        CREATE INDEX IF NOT EXISTS idx_invitations_user ON user_invitations (user_id)
        "#,
    ),
];

/// Run all migrations and install the reference roles.
pub async fn run(pool: &PgPool) -> Result<()> {
    tracing::info!("Running schema migrations...");

    for (name, statement) in SCHEMA {
        // raw_sql: the index step holds several statements
        sqlx::raw_sql(statement).execute(pool).await?;
        tracing::debug!(step = *name, "migration applied");
    }

    for role in Role::reference_roles() {
        sqlx::query(
            r#"
            INSERT INTO roles (name, level, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&role.name)
        .bind(role.level)
        .bind(&role.description)
        .execute(pool)
        .await?;
    }

    tracing::info!("Schema migrations complete");
    Ok(())
}
