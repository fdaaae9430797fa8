//! Authentication-related models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,

    #[validate(
        email(message = "Email must be valid"),
        length(max = 100, message = "Email must not exceed 100 characters")
    )]
    pub email: String,

    pub password: String,

    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Token pair returned by register, login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// seconds until the access token expires
    pub expires_in: u64,
}

impl AuthenticationResponse {
    pub fn bearer(access_token: String, refresh_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "johndoe".to_string(),
            email: "john@example.com".to_string(),
            password: "SecurePassword123".to_string(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid.clone()
        };
        let errors = bad_email.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let short_name = RegisterRequest {
            username: "jd".to_string(),
            ..valid
        };
        assert!(short_name.validate().is_err());
    }

    #[test]
    fn test_register_request_uses_camel_case() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "johndoe",
            "email": "john@example.com",
            "password": "SecurePassword123",
            "firstName": "John",
            "lastName": "Doe"
        }))
        .unwrap();
        assert_eq!(req.first_name, "John");
    }

    #[test]
    fn test_login_request_password_length() {
        let short = LoginRequest {
            username: "johndoe".to_string(),
            password: "Short1".to_string(),
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let ok = LoginRequest {
            password: "SecurePassword123".to_string(),
            ..short
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_blank_refresh_token_is_invalid() {
        let blank = RefreshTokenRequest {
            refresh_token: String::new(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_authentication_response_shape() {
        let response = AuthenticationResponse::bearer("a".to_string(), "r".to_string(), 3600);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["tokenType"], "Bearer");
        assert_eq!(json["expiresIn"], 3600);
    }
}
