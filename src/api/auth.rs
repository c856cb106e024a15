//! Registration, login, and the bearer-token authentication guard.
//!
//! Sessions are stateless HS256 tokens carrying the username; logging in
//! with a still-valid token and no credentials reissues a fresh token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::{AuthResponse, LoginRequest, RegisterRequest, User};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_password, validate_username};

/// Claims embedded in a session token
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    iat: i64,
    exp: i64,
}

/// Errors from session token issuance
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("session token secret is not configured")]
    MissingSecret,
    #[error("failed to sign session token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        tracing::error!("Token error: {}", err);
        ApiError::internal("Failed to issue session token")
    }
}

/// Sign a session token for a username
pub fn sign_token(username: &str, config: &AuthConfig) -> Result<String, TokenError> {
    if config.jwt_secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let now = Utc::now();
    let claims = Claims {
        username: username.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp(),
    };

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &encoding_key).map_err(TokenError::Sign)
}

/// Verify a session token and extract the embedded username.
///
/// Any failure (bad signature, expired, malformed) is reported uniformly
/// as `None`; callers treat that as "unauthenticated".
pub fn verify_token(token: &str, config: &AuthConfig) -> Option<String> {
    if config.jwt_secret.is_empty() {
        return None;
    }

    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims.username)
        .ok()
}

/// Generate a random per-user password salt
fn generate_salt() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Hash a password together with its stored per-user salt using Argon2
pub fn hash_password(
    password: &str,
    salt: &str,
) -> Result<String, argon2::password_hash::Error> {
    let salted = format!("{}{}", password, salt);
    let argon_salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(salted.as_bytes(), &argon_salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash and per-user salt
pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    let salted = format!("{}{}", password, salt);
    Argon2::default()
        .verify_password(salted.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get("Authorization").and_then(|h| h.to_str().ok())?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Register endpoint
///
/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_username(&req.username) {
        errors.add("username", &e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", &e);
    }
    errors.finish()?;

    let salt = generate_salt();
    let password_hash = hash_password(&req.password, &salt).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to hash password")
    })?;

    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO users (username, password_hash, password_salt, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&req.username)
    .bind(&password_hash)
    .bind(&salt)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        // Duplicate usernames are a client error, not a conflict
        if e.to_string().contains("UNIQUE constraint failed") {
            ApiError::bad_request("Username is already taken")
        } else {
            tracing::error!("Failed to create user: {}", e);
            ApiError::database("Failed to create user")
        }
    })?;

    tracing::info!(username = %req.username, "User registered");

    let token = sign_token(&req.username, &state.config.auth)?;
    Ok(Json(AuthResponse {
        token,
        username: req.username,
    }))
}

/// Login endpoint
///
/// POST /login
///
/// Accepts `{username, password}`, or an empty body with a valid bearer
/// token to refresh the session without credentials.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Option<Json<LoginRequest>>,
) -> Result<Json<AuthResponse>, ApiError> {
    let LoginRequest { username, password } =
        payload.map(|Json(req)| req).unwrap_or_default();

    // Token-only login: reissue a fresh token for the same username
    if username.is_none() && password.is_none() {
        let token_username = extract_token(&headers)
            .and_then(|token| verify_token(&token, &state.config.auth));

        if let Some(username) = token_username {
            let token = sign_token(&username, &state.config.auth)?;
            return Ok(Json(AuthResponse { token, username }));
        }

        return Err(ApiError::unauthorized("Access denied"));
    }

    // Credential login
    if let (Some(username), Some(password)) = (username, password) {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&state.db)
            .await?;

        // Same error whether the user is missing or the password is wrong
        let user = user.ok_or_else(|| ApiError::unauthorized("Wrong username or password"))?;

        if !verify_password(&password, &user.password_salt, &user.password_hash) {
            return Err(ApiError::unauthorized("Wrong username or password"));
        }

        let token = sign_token(&username, &state.config.auth)?;
        return Ok(Json(AuthResponse { token, username }));
    }

    Err(ApiError::unauthorized("Access denied"))
}

/// Authenticated user context resolved from a bearer token.
///
/// This is the single authorization step shared by all protected handlers:
/// it verifies the token and resolves the embedded username to a user row,
/// failing with 401 on any problem.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Access unauthorized"))?;

        let username = verify_token(&token, &state.config.auth)
            .ok_or_else(|| ApiError::unauthorized("Access unauthorized"))?;

        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(&username)
            .fetch_optional(&state.db)
            .await?;

        let (id,) = row.ok_or_else(|| ApiError::unauthorized("Access unauthorized"))?;

        Ok(AuthUser { id, username })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    async fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(Config::default(), test_pool().await))
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        headers
    }

    fn register_request(username: &str) -> Json<RegisterRequest> {
        Json(RegisterRequest {
            username: username.to_string(),
            password: "TestPassword1_".to_string(),
        })
    }

    fn login_request(username: &str, password: &str) -> Option<Json<LoginRequest>> {
        Some(Json(LoginRequest {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        }))
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("TestPassword1_", "somesalt").unwrap();
        assert!(verify_password("TestPassword1_", "somesalt", &hash));
        assert!(!verify_password("WrongPassword1_", "somesalt", &hash));
        assert!(!verify_password("TestPassword1_", "othersalt", &hash));
        assert!(!verify_password("TestPassword1_", "somesalt", "not-a-hash"));
    }

    #[test]
    fn test_token_sign_and_verify() {
        let config = AuthConfig::default();
        let token = sign_token("alice", &config).unwrap();

        assert_eq!(verify_token(&token, &config), Some("alice".to_string()));

        // Tampered token fails verification
        let tampered = format!("{}x", token);
        assert_eq!(verify_token(&tampered, &config), None);

        // Token signed with a different secret fails verification
        let other = AuthConfig::default();
        assert_eq!(verify_token(&token, &other), None);
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&bearer("abc")), Some("abc".to_string()));
        assert_eq!(extract_token(&bearer("")), None);

        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Basic abc".parse().unwrap());
        assert_eq!(extract_token(&headers), None);
    }

    #[tokio::test]
    async fn test_register_then_duplicate_is_rejected() {
        let state = test_state().await;

        let response = register(State(state.clone()), register_request("dupuser"))
            .await
            .unwrap();
        assert_eq!(response.0.username, "dupuser");
        assert!(!response.0.token.is_empty());

        let err = register(State(state), register_request("dupuser"))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let state = test_state().await;

        let err = register(
            State(state),
            Json(RegisterRequest {
                username: "ok_user".to_string(),
                password: "short".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_with_credentials() {
        let state = test_state().await;
        register(State(state.clone()), register_request("loginuser"))
            .await
            .unwrap();

        let response = login(
            State(state.clone()),
            HeaderMap::new(),
            login_request("loginuser", "TestPassword1_"),
        )
        .await
        .unwrap();
        assert_eq!(response.0.username, "loginuser");

        let err = login(
            State(state.clone()),
            HeaderMap::new(),
            login_request("loginuser", "WRONG_PASSWORD"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);

        let err = login(
            State(state),
            HeaderMap::new(),
            login_request("nobody", "TestPassword1_"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_with_session_token() {
        let state = test_state().await;
        let registered = register(State(state.clone()), register_request("tokenuser"))
            .await
            .unwrap();

        // Valid token, no credentials: a fresh token for the same user
        let response = login(State(state.clone()), bearer(&registered.0.token), None)
            .await
            .unwrap();
        assert_eq!(response.0.username, "tokenuser");
        assert_eq!(
            verify_token(&response.0.token, &state.config.auth),
            Some("tokenuser".to_string())
        );

        // Tampered token
        let err = login(
            State(state.clone()),
            bearer(&format!("{}WRONG", registered.0.token)),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);

        // No token, no credentials
        let err = login(State(state), HeaderMap::new(), None).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
