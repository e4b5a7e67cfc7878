use serde::Serialize;
use validator::Validate;

/// Login payload for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
}

/// Registration payload for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "User name must be between 1 and 64 characters"
    ))]
    pub user_name: String,
    #[validate(email(message = "Email address is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_validates_email() {
        let req = LoginRequest {
            email: "nobody".to_string(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_err());

        let req = LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn register_request_serializes_camel_case() {
        let req = RegisterRequest {
            user_name: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct-horse".to_string(),
        };
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["userName"], "ada");
        assert_eq!(body["email"], "ada@example.com");
    }

    #[test]
    fn register_request_rejects_short_password() {
        let req = RegisterRequest {
            user_name: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
