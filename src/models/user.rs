//! User domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Coarse permission tier carried by every principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Authority string used by authorization checks, e.g. `ROLE_USER`
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// User account (the principal behind every token)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,

    // Metadata
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// New account with the default role and no login recorded yet
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            first_name,
            last_name,
            role: Role::User,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn record_login(mut self) -> Self {
        self.last_login_at = Some(Utc::now());
        self
    }

    /// The only path by which a role escalates
    pub fn promote_to_admin(mut self) -> Self {
        self.role = Role::Admin;
        self.updated_at = Utc::now();
        self
    }
}

/// Row shape of the `users` table; role is stored as text
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRecord> for User {
    type Error = String;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            first_name: record.first_name,
            last_name: record.last_name,
            role: record.role.parse()?,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_login_at: record.last_login_at,
        })
    }
}

/// User response (without sensitive data)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> User {
        User::new(
            "johndoe",
            "john@example.com",
            "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA",
            Some("John".to_string()),
            Some("Doe".to_string()),
        )
    }

    #[test]
    fn test_new_user_defaults_to_user_role() {
        let user = john();
        assert_eq!(user.role, Role::User);
        assert!(user.last_login_at.is_none());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_record_login_keeps_identity() {
        let user = john();
        let id = user.id;
        let logged_in = user.record_login();
        assert_eq!(logged_in.id, id);
        assert!(logged_in.last_login_at.is_some());
        assert_eq!(logged_in.role, Role::User);
    }

    #[test]
    fn test_promote_to_admin() {
        let user = john();
        let created_at = user.created_at;
        let admin = user.promote_to_admin();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.created_at, created_at);
        assert!(admin.updated_at >= created_at);
    }

    #[test]
    fn test_role_authority_and_parsing() {
        assert_eq!(Role::User.authority(), "ROLE_USER");
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(john()).unwrap();
        assert!(json.get("password_hash").is_none());

        let response = serde_json::to_value(UserResponse::from(john())).unwrap();
        assert!(response.get("passwordHash").is_none());
        assert_eq!(response["firstName"], "John");
        assert_eq!(response["role"], "USER");
    }

    #[test]
    fn test_record_with_unknown_role_is_rejected() {
        let user = john();
        let record = UserRecord {
            id: user.id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: None,
            last_name: None,
            role: "SUPERUSER".to_string(),
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: None,
        };
        assert!(User::try_from(record).is_err());
    }
}
