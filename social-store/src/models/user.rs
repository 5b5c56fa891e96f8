//! Users and their credentials

use std::fmt;
use std::time::Duration;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Role, ValidationError};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password: Password,
    pub is_active: bool,
    pub role_id: i64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New, not yet persisted user with the default role.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            role: Role {
                name: super::role::DEFAULT_ROLE.to_string(),
                ..Role::default()
            },
            ..Self::default()
        }
    }

    /// Role name to resolve on insert, falling back to the default role.
    pub(crate) fn role_name(&self) -> &str {
        if self.role.name.is_empty() {
            super::role::DEFAULT_ROLE
        } else {
            &self.role.name
        }
    }
}

/// Argon2 password hash. The plaintext is never retained.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password {
    hash: Option<String>,
}

impl Password {
    /// Hash `plaintext` with a fresh random salt.
    pub fn hashed(plaintext: &str) -> Result<Self> {
        let mut password = Self::default();
        password.set(plaintext)?;
        Ok(password)
    }

    pub fn set(&mut self, plaintext: &str) -> Result<()> {
        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|err| StoreError::Password(err.to_string()))?;
        let hash = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| StoreError::Password(err.to_string()))?;
        self.hash = Some(hash.to_string());
        Ok(())
    }

    /// Check `plaintext` against the stored hash. No hash never matches.
    pub fn matches(&self, plaintext: &str) -> bool {
        let Some(hash) = self.hash.as_deref() else {
            return false;
        };
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn is_set(&self) -> bool {
        self.hash.is_some()
    }

    pub(crate) fn from_hash(hash: Option<String>) -> Self {
        Self { hash }
    }

    pub(crate) fn as_hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("hash", &self.hash.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Hex SHA-256 of an invitation token, the form tokens are stored in.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Absolute expiry of an invitation issued now with lifetime `ttl`.
pub(crate) fn invitation_expiry(ttl: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| {
            StoreError::Invalid(ValidationError::InvalidFormat {
                field: "invitation_ttl",
                value: format!("{ttl:?}"),
                reason: "expiry out of range".to_owned(),
            })
        })
}
