use async_trait::async_trait;
use sqlx::FromRow;
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod repo;

pub use repo::PgUserStore;

/// Account row in `usuarios`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String, // bcrypt, never serialized
}

#[derive(Debug)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for user accounts.
///
/// Email uniqueness is enforced by the store itself: `create` is the only
/// place a duplicate is detected, so concurrent registrations cannot both win.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError>;
    async fn create(&self, new: NewUser<'_>) -> Result<User, StoreError>;
    /// Returns `false` when no row has this id.
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, StoreError>;
}
