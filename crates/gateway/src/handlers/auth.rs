//! Registration and login

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use scholarhub_common::{
    auth::{hash_password_blocking, verify_password_blocking},
    db::models::User,
    errors::{AppError, Result},
    metrics,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username, or an email when it contains `@`
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl RegisterRequest {
    /// Surrounding whitespace is not part of a username or email
    fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

fn auth_response(state: &AppState, user: User, message: Option<String>) -> Result<AuthResponse> {
    let token = state.jwt.generate_token(user.id, &user.username)?;
    Ok(AuthResponse {
        message,
        token,
        user_id: user.id,
        username: user.username,
        email: user.email,
    })
}

/// Create a user and their empty profile
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let request = request.trimmed();
    request.validate()?;
    let repo = state.repo();

    let password_hash = hash_password_blocking(request.password).await?;
    let user = match repo.create_user(&request.username, &request.email, password_hash).await {
        Ok(user) => user,
        Err(e) => {
            metrics::record_auth("register", false);
            return Err(e);
        }
    };

    metrics::record_auth("register", true);
    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let response = auth_response(&state, user, Some("User registered successfully".to_string()))?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    request.validate()?;
    let repo = state.repo();
    let login = request.username.trim();

    let user = if login.contains('@') {
        repo.find_user_by_email(login).await?
    } else {
        repo.find_user_by_username(login).await?
    };

    let verified = match &user {
        Some(user) => verify_password_blocking(request.password, user.password_hash.clone()).await?,
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            metrics::record_auth("login", false);
            tracing::warn!(login = %login, "Failed login attempt");
            return Err(AppError::InvalidCredentials);
        }
    };

    metrics::record_auth("login", true);
    Ok(Json(auth_response(&state, user, None)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let missing: RegisterRequest = serde_json::from_str(r#"{"username":"ada"}"#).unwrap();
        assert!(missing.validate().is_err());

        let bad_email: RegisterRequest =
            serde_json::from_str(r#"{"username":"ada","email":"nope","password":"pw"}"#).unwrap();
        assert!(bad_email.validate().is_err());

        let ok: RegisterRequest = serde_json::from_str(
            r#"{"username":"ada","email":"ada@example.org","password":"pw"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_username_is_trimmed_before_validation() {
        let blank: RegisterRequest = serde_json::from_str(
            r#"{"username":"   ","email":"ada@example.org","password":"pw"}"#,
        )
        .unwrap();
        let err: AppError = blank.trimmed().validate().unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let padded = format!(
            r#"{{"username":" {} ","email":" ada@example.org ","password":" pw "}}"#,
            "a".repeat(150)
        );
        let request: RegisterRequest = serde_json::from_str(&padded).unwrap();
        let request = request.trimmed();
        assert!(request.validate().is_ok());
        assert_eq!(request.username.len(), 150);
        assert_eq!(request.email, "ada@example.org");
        assert_eq!(request.password, " pw ");
    }

    #[test]
    fn test_missing_fields_are_client_errors() {
        let request: LoginRequest = serde_json::from_str("{}").unwrap();
        let err: AppError = request.validate().unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
