//! In-process user store, used by the `memory` backend and the test suites

use super::{email_taken, username_taken, UserStore};
use crate::{db::HealthStatus, error::AppError, models::user::User};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn save(&self, user: User) -> Result<User, AppError> {
        // Uniqueness check and write happen under one write lock
        let mut users = self.users.write().await;

        for other in users.values().filter(|u| u.id != user.id) {
            if other.username == user.username {
                return Err(username_taken(&user.username));
            }
            if other.email == user.email {
                return Err(email_taken(&user.email));
            }
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn record_login(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;

        Ok(users.get_mut(&id).map(|stored| {
            *stored = stored.clone().record_login();
            stored.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(username: &str, email: &str) -> User {
        User::new(username, email, "hash", None, None)
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = InMemoryUserStore::new();
        let saved = store.save(user("johndoe", "john@example.com")).await.unwrap();

        let by_name = store.find_by_username("johndoe").await.unwrap().unwrap();
        assert_eq!(by_name.id, saved.id);

        let by_email = store.find_by_email("john@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, saved.id);

        assert!(store.find_by_id(saved.id).await.unwrap().is_some());
        assert!(store.exists_by_username("johndoe").await.unwrap());
        assert!(!store.exists_by_email("jane@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_updates_existing_id() {
        let store = InMemoryUserStore::new();
        let saved = store.save(user("johndoe", "john@example.com")).await.unwrap();

        store.save(saved.clone().promote_to_admin()).await.unwrap();

        assert_eq!(store.len().await, 1);
        let reloaded = store.find_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(reloaded.role, crate::models::user::Role::Admin);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_conflict() {
        let store = InMemoryUserStore::new();
        store.save(user("johndoe", "john@example.com")).await.unwrap();

        let err = store
            .save(user("johndoe", "other@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), 409);
        assert_eq!(err.user_message(), "User with username johndoe already exists");

        let err = store
            .save(user("janedoe", "john@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "User with email john@example.com already exists");
    }

    #[tokio::test]
    async fn test_record_login_keeps_concurrent_promotion() {
        let store = InMemoryUserStore::new();
        let stale = store.save(user("johndoe", "john@example.com")).await.unwrap();

        // Promotion lands after the login path has read its copy
        store.save(stale.clone().promote_to_admin()).await.unwrap();

        let logged_in = store.record_login(stale.id).await.unwrap().unwrap();
        assert_eq!(logged_in.role, crate::models::user::Role::Admin);
        assert!(logged_in.last_login_at.is_some());

        let reloaded = store.find_by_id(stale.id).await.unwrap().unwrap();
        assert_eq!(reloaded.role, crate::models::user::Role::Admin);
        assert_eq!(reloaded.last_login_at, logged_in.last_login_at);

        assert!(store.record_login(uuid::Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = InMemoryUserStore::new();
        let saved = store.save(user("johndoe", "john@example.com")).await.unwrap();

        assert!(store.delete_by_id(saved.id).await.unwrap());
        assert!(!store.delete_by_id(saved.id).await.unwrap());
        assert!(store.is_empty().await);
        assert!(store.health().await.is_healthy());
    }
}
