//! Authorization roles (read-only reference data)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the role assigned when a user is created without one
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub level: i32,
    pub description: String,
}

impl Role {
    /// Reference roles installed by the migrations, lowest level first.
    pub fn reference_roles() -> Vec<Role> {
        vec![
            Role {
                id: 1,
                name: "user".to_string(),
                level: 1,
                description: "A user can create posts and comments".to_string(),
            },
            Role {
                id: 2,
                name: "moderator".to_string(),
                level: 2,
                description: "A moderator can update other users posts".to_string(),
            },
            Role {
                id: 3,
                name: "admin".to_string(),
                level: 3,
                description: "An admin can update and delete other users posts".to_string(),
            },
        ]
    }
}
