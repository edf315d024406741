//! Authentication utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Argon2 password hashing
//! - `AuthContext` extraction (required and optional)

use crate::errors::{AppError, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The authenticated caller, available to handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            expiration_secs: expiration_secs as i64,
        }
    }

    /// Generate a new JWT token
    pub fn generate_token(&self, user_id: Uuid, username: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = JwtClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::Internal {
                message: format!("Failed to generate token: {}", e),
            }
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid token".to_string(),
                },
            })
    }

    /// Validate a token and turn its claims into an [`AuthContext`]
    pub fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized {
            message: "Invalid token subject".to_string(),
        })?;
        Ok(AuthContext {
            user_id,
            username: claims.username,
        })
    }
}

/// Hash a password with a fresh salt (PHC string format)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Check a password against a stored PHC hash; malformed hashes never verify
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// [`hash_password`] on the blocking thread pool
pub async fn hash_password_blocking(password: String) -> Result<String> {
    run_blocking(move || hash_password(&password)).await?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(password: String, stored_hash: String) -> Result<bool> {
    run_blocking(move || verify_password(&password, &stored_hash)).await
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal {
            message: format!("Password task failed: {}", e),
        })
}

/// Extract the token from an `Authorization: Bearer` header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn header_token(parts: &Parts) -> Option<Result<&str>> {
    let value = parts.headers.get(AUTHORIZATION)?;
    Some(
        value
            .to_str()
            .ok()
            .and_then(extract_bearer)
            .ok_or_else(|| AppError::Unauthorized {
                message: "Authorization header must be 'Bearer <token>'".to_string(),
            }),
    )
}

/// Axum extractor: the route requires a valid token
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let token = header_token(parts).ok_or_else(|| AppError::Unauthorized {
            message: "Missing Authorization header".to_string(),
        })??;
        Arc::<JwtManager>::from_ref(state).authenticate(token)
    }
}

/// `Option<AuthContext>`: anonymous callers are allowed, bad tokens are not
impl<S> OptionalFromRequestParts<S> for AuthContext
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Option<Self>> {
        match header_token(parts) {
            None => Ok(None),
            Some(token) => Arc::<JwtManager>::from_ref(state)
                .authenticate(token?)
                .map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use axum::http::Request;

    #[derive(Clone)]
    struct TestState {
        jwt: Arc<JwtManager>,
    }

    impl FromRef<TestState> for Arc<JwtManager> {
        fn from_ref(state: &TestState) -> Self {
            state.jwt.clone()
        }
    }

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/profile");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        let user_id = Uuid::new_v4();

        let token = manager.generate_token(user_id, "ada").unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "ada");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_wrong_secret_rejected() {
        let issuer = JwtManager::new("secret-a", 3600);
        let verifier = JwtManager::new("secret-b", 3600);
        let token = issuer.generate_token(Uuid::new_v4(), "ada").unwrap();

        let err = verifier.validate_token(&token).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token() {
        let manager = JwtManager::new("test_secret", 3600);
        let claims = JwtClaims {
            sub: Uuid::new_v4().to_string(),
            username: "ada".to_string(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        assert!(matches!(manager.validate_token(&token), Err(AppError::ExpiredToken)));
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_work_runs_off_the_runtime() {
        let hash = assert_ok!(hash_password_blocking("correct horse".to_string()).await);
        let ok = verify_password_blocking("correct horse".to_string(), hash.clone());
        let bad = verify_password_blocking("wrong horse".to_string(), hash);
        assert!(assert_ok!(ok.await));
        assert!(!assert_ok!(bad.await));

        let worker = std::thread::current().id();
        let pool = assert_ok!(run_blocking(|| std::thread::current().id()).await);
        assert_ne!(worker, pool);
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[tokio::test]
    async fn test_extractor_required_and_optional() {
        let state = TestState {
            jwt: Arc::new(JwtManager::new("test_secret", 3600)),
        };
        let user_id = Uuid::new_v4();
        let token = state.jwt.generate_token(user_id, "ada").unwrap();
        let bearer = format!("Bearer {}", token);

        let mut parts = parts_with(Some(&bearer));
        let ctx = <AuthContext as FromRequestParts<_>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(ctx.user_id, user_id);

        let mut anonymous = parts_with(None);
        let missing =
            <AuthContext as FromRequestParts<_>>::from_request_parts(&mut anonymous, &state).await;
        assert!(matches!(missing, Err(AppError::Unauthorized { .. })));

        let optional = assert_ok!(
            <AuthContext as OptionalFromRequestParts<_>>::from_request_parts(&mut anonymous, &state)
                .await
        );
        assert!(optional.is_none());

        let mut garbage = parts_with(Some("Bearer nonsense"));
        assert_err!(
            <AuthContext as OptionalFromRequestParts<_>>::from_request_parts(&mut garbage, &state)
                .await
        );
    }
}
