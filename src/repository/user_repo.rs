//! User repository (数据库访问层)

use super::{email_taken, username_taken, UserStore};
use crate::{
    db::{self, HealthStatus},
    error::AppError,
    models::user::{User, UserRecord},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, sql: &str, value: &str) -> Result<Option<User>, AppError> {
        let record = sqlx::query_as::<_, UserRecord>(sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;

        record.map(into_user).transpose()
    }
}

fn into_user(record: UserRecord) -> Result<User, AppError> {
    User::try_from(record).map_err(|e| {
        tracing::error!("Corrupt user row: {}", e);
        AppError::Internal(e)
    })
}

/// 唯一约束冲突映射为 409
fn map_write_error(e: sqlx::Error, user: &User) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("idx_users_email") => email_taken(&user.email),
                _ => username_taken(&user.username),
            };
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        record.map(into_user).transpose()
    }

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_one("SELECT * FROM users WHERE username = $1", username)
            .await
    }

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one("SELECT * FROM users WHERE email = $1", email)
            .await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.db)
                .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.db)
            .await?;

        Ok(exists)
    }

    /// 插入或按 ID 更新
    async fn save(&self, user: User) -> Result<User, AppError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, first_name, last_name,
                role, created_at, updated_at, last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                role = EXCLUDED.role,
                updated_at = EXCLUDED.updated_at,
                last_login_at = EXCLUDED.last_login_at
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        into_user(record)
    }

    /// 仅更新最近登录时间，不覆盖其他字段
    async fn record_login(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "UPDATE users SET last_login_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        record.map(into_user).transpose()
    }

    /// 删除用户
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health(&self) -> HealthStatus {
        db::health_check(&self.db).await
    }
}
