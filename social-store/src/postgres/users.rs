//! User repository
//!
//! Reads JOIN the user's role and only ever return active users.
//! Invitation tokens are looked up by their SHA-256 hash.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::models::{hash_token, invitation_expiry, Password, Role, User};
use crate::repos::UserRepository;
use crate::tx::StoreTx;

const SELECT_ACTIVE_USER: &str = r#"
    SELECT
        u.id, u.username, u.email, u.password, u.is_active, u.created_at,
        r.id AS role_id, r.name AS role_name, r.level AS role_level,
        r.description AS role_description
    FROM users u
    JOIN roles r ON r.id = u.role_id
    WHERE u.is_active = true
"#;

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_active<'q>(
        &self,
        ctx: &QueryContext,
        query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> Result<Option<User>> {
        let row = ctx.run(query.fetch_optional(&self.pool)).await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }
}

fn user_from_row(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    let role_id: i64 = row.try_get("role_id")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password: Password::from_hash(row.try_get("password")?),
        is_active: row.try_get("is_active")?,
        role_id,
        role: Role {
            id: role_id,
            name: row.try_get("role_name")?,
            level: row.try_get("role_level")?,
            description: row.try_get("role_description")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl UserRepository for PgUserStore {
    #[tracing::instrument(skip(self, ctx, tx, user), fields(username = %user.username))]
    async fn create(&self, ctx: &QueryContext, tx: &mut StoreTx, user: &mut User) -> Result<()> {
        let conn = tx.pg_conn()?;
        let role_name = user.role_name().to_owned();

        let role = ctx
            .run(
                sqlx::query_as::<_, Role>(
                    "SELECT id, name, level, description FROM roles WHERE name = $1",
                )
                .bind(&role_name)
                .fetch_optional(&mut *conn),
            )
            .await?
            .ok_or_else(|| StoreError::not_found("role", &role_name))?;

        let row = ctx
            .run(async {
                sqlx::query(
                    r#"
                    INSERT INTO users (username, password, email, is_active, role_id)
                    VALUES ($1, $2, $3, $4, $5)
                    RETURNING id, created_at
                    "#,
                )
                .bind(&user.username)
                .bind(user.password.as_hash())
                .bind(&user.email)
                .bind(user.is_active)
                .bind(role.id)
                .fetch_one(&mut *conn)
                .await
                .map_err(|err| StoreError::from_insert(err, "user"))
            })
            .await?;

        user.id = row.try_get("id")?;
        user.created_at = row.try_get("created_at")?;
        user.role_id = role.id;
        user.role = role;
        Ok(())
    }

    async fn get_by_id(&self, ctx: &QueryContext, id: i64) -> Result<User> {
        let sql = format!("{SELECT_ACTIVE_USER} AND u.id = $1");
        self.fetch_active(ctx, sqlx::query(&sql).bind(id))
            .await?
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    async fn get_by_email(&self, ctx: &QueryContext, email: &str) -> Result<User> {
        let sql = format!("{SELECT_ACTIVE_USER} AND u.email = $1");
        self.fetch_active(ctx, sqlx::query(&sql).bind(email))
            .await?
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    #[tracing::instrument(skip(self, ctx, user, token), fields(username = %user.username))]
    async fn create_and_invite(
        &self,
        ctx: &QueryContext,
        user: &mut User,
        token: &str,
        ttl: Duration,
    ) -> Result<()> {
        let expiry = invitation_expiry(ttl)?;
        let mut staged = user.clone();
        staged.is_active = false;

        let mut tx = super::begin(&self.pool, ctx).await?;
        let outcome = async {
            self.create(ctx, &mut tx, &mut staged).await?;
            let conn = tx.pg_conn()?;
            ctx.run(async {
                sqlx::query(
                    "INSERT INTO user_invitations (token, user_id, expiry) VALUES ($1, $2, $3)",
                )
                .bind(hash_token(token))
                .bind(staged.id)
                .bind(expiry)
                .execute(&mut *conn)
                .await
                .map_err(|err| StoreError::from_insert(err, "invitation"))
            })
            .await?;
            Ok::<_, StoreError>(())
        }
        .await;
        tx.finish(outcome).await?;

        *user = staged;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn activate(&self, ctx: &QueryContext, token: &str) -> Result<()> {
        let token_hash = hash_token(token);
        let mut tx = super::begin(&self.pool, ctx).await?;
        let outcome = async {
            let conn = tx.pg_conn()?;
            let user_id = ctx
                .run(
                    sqlx::query_scalar::<_, i64>(
                        r#"
                        SELECT u.id
                        FROM users u
                        JOIN user_invitations ui ON ui.user_id = u.id
                        WHERE ui.token = $1 AND ui.expiry > NOW()
                        "#,
                    )
                    .bind(&token_hash)
                    .fetch_optional(&mut *conn),
                )
                .await?
                .ok_or_else(|| StoreError::not_found("invitation", "token"))?;

            ctx.run(
                sqlx::query("UPDATE users SET is_active = true WHERE id = $1")
                    .bind(user_id)
                    .execute(&mut *conn),
            )
            .await?;
            ctx.run(
                sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut *conn),
            )
            .await?;

            tracing::debug!(user_id, "user activated");
            Ok::<_, StoreError>(())
        }
        .await;
        tx.finish(outcome).await
    }

    #[tracing::instrument(skip(self, ctx))]
    async fn delete(&self, ctx: &QueryContext, id: i64) -> Result<()> {
        let mut tx = super::begin(&self.pool, ctx).await?;
        let outcome = async {
            let conn = tx.pg_conn()?;
            ctx.run(
                sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
                    .bind(id)
                    .execute(&mut *conn),
            )
            .await?;
            let deleted = ctx
                .run(
                    sqlx::query("DELETE FROM users WHERE id = $1")
                        .bind(id)
                        .execute(&mut *conn),
                )
                .await?;
            if deleted.rows_affected() == 0 {
                return Err(StoreError::not_found("user", id));
            }
            Ok::<_, StoreError>(())
        }
        .await;
        tx.finish(outcome).await
    }
}
