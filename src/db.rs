//! PostgreSQL 用户库：连接、建表迁移、连通性检查

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database.url is not set")]
    MissingUrl,

    #[error("cannot connect to user database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("cannot migrate user database: {0}")]
    Migrate(#[source] MigrateError),
}

/// 存储后端的可用性
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
}

/// 连接用户库并应用 `migrations/` 下的建表脚本
pub async fn open_user_database(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let url = config.url.as_ref().ok_or(DbError::MissingUrl)?;

    let pool = pool_options(config)
        .connect(url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User database unreachable");
            DbError::Connect(e)
        })?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "User table migration failed");
            DbError::Migrate(e)
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        "User database ready"
    );

    Ok(pool)
}

/// 就绪检查使用
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthStatus::Healthy,
        Err(e) => {
            tracing::warn!(error = %e, "User database ping failed");
            HealthStatus::Unhealthy(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postgres_config() -> DatabaseConfig {
        DatabaseConfig {
            backend: "postgres".to_string(),
            url: None,
            max_connections: 4,
            min_connections: 1,
            acquire_timeout_secs: 2,
            idle_timeout_secs: 30,
            max_lifetime_secs: 600,
        }
    }

    #[test]
    fn test_pool_options_follow_config() {
        let options = pool_options(&postgres_config());

        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(2));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(600)));
        assert!(options.get_test_before_acquire());
    }

    #[tokio::test]
    async fn test_open_without_url_fails_before_connecting() {
        let err = open_user_database(&postgres_config()).await.unwrap_err();
        assert!(matches!(err, DbError::MissingUrl));
        assert_eq!(err.to_string(), "database.url is not set");
    }

    #[test]
    fn test_unhealthy_carries_reason() {
        assert!(HealthStatus::Healthy.is_healthy());

        let status = HealthStatus::Unhealthy("connection refused".to_string());
        assert!(!status.is_healthy());
        assert_eq!(
            status,
            HealthStatus::Unhealthy("connection refused".to_string())
        );
    }
}
