//! Database repository layer

pub mod memory;
pub mod user_repo;

pub use memory::InMemoryUserStore;
pub use user_repo::PgUserStore;

use crate::{db::HealthStatus, error::AppError, models::user::User};
use async_trait::async_trait;
use uuid::Uuid;

/// Lookup and persistence of principals
///
/// Usernames and emails are unique across all records. `save` inserts when the id is
/// new and updates otherwise; a uniqueness violation surfaces as `AppError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn save(&self, user: User) -> Result<User, AppError>;

    /// Stamp `last_login_at` on the stored record only, leaving every other field as stored
    async fn record_login(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Returns whether a record was removed
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;

    async fn health(&self) -> HealthStatus;
}

pub(crate) fn username_taken(username: &str) -> AppError {
    AppError::Conflict(format!("User with username {} already exists", username))
}

pub(crate) fn email_taken(email: &str) -> AppError {
    AppError::Conflict(format!("User with email {} already exists", email))
}
