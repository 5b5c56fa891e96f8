use async_trait::async_trait;
use sqlx::PgPool;

use crate::context::QueryContext;
use crate::error::{Result, StoreError};
use crate::models::Role;
use crate::repos::RoleRepository;

#[derive(Debug, Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleStore {
    async fn get_by_name(&self, ctx: &QueryContext, name: &str) -> Result<Role> {
        ctx.run(
            sqlx::query_as::<_, Role>(
                "SELECT id, name, level, description FROM roles WHERE name = $1",
            )
            .bind(name)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| StoreError::not_found("role", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postgres::testing;

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reference_roles_are_installed() {
        let pool = testing::pool().await;
        let store = PgRoleStore::new(pool);
        let ctx = QueryContext::background();

        for expected in Role::reference_roles() {
            let role = store.get_by_name(&ctx, &expected.name).await.expect("role");
            assert_eq!(role.level, expected.level);
        }
        assert!(store.get_by_name(&ctx, "root").await.unwrap_err().is_not_found());
    }
}
