use async_trait::async_trait;
use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::auth::{AuthToken, LoginRequest};
use crate::models::category::{Category, DefaultCategory};
use crate::models::user::{CreateUserRequest, User};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::{EMAIL_CONSTRAINT, RepositoryError, USERNAME_CONSTRAINT};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    iat: i64,
    exp: i64,
}

/// Authentication service errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for AuthError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::ConstraintViolation(c) if c == USERNAME_CONSTRAINT => {
                AuthError::DuplicateUsername
            }
            RepositoryError::ConstraintViolation(c) if c == EMAIL_CONSTRAINT => {
                AuthError::DuplicateEmail
            }
            other => AuthError::DatabaseError(other.to_string()),
        }
    }
}

/// Token and hashing parameters for the auth service
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub default_category: DefaultCategory,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::minutes(30),
            bcrypt_cost: DEFAULT_COST,
            default_category: DefaultCategory::default(),
        }
    }
}

/// Trait defining authentication service operations
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user along with their default category
    async fn register(&self, request: CreateUserRequest) -> Result<User, AuthError>;

    /// Authenticate user and return a bearer token
    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError>;

    /// Validate a bearer token and return the id of the user it was issued for.
    /// Tokens of users that no longer exist are invalid.
    async fn validate_token(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// Hash a password using bcrypt
pub(crate) fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Implementation of AuthService
pub struct AuthServiceImpl {
    user_repository: Arc<dyn UserRepository>,
    settings: AuthSettings,
    /// Checked against on unknown usernames so every login pays for one bcrypt verify
    dummy_hash: String,
}

impl AuthServiceImpl {
    pub fn new(user_repository: Arc<dyn UserRepository>, settings: AuthSettings) -> Self {
        let dummy_hash = hash_password("not-a-real-password", settings.bcrypt_cost)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "could not prepare dummy password hash");
                String::new()
            });
        Self {
            user_repository,
            settings,
            dummy_hash,
        }
    }

    /// Verify a password against a hash
    fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        verify(password, hash)
            .map_err(|e| AuthError::InternalError(format!("Password verification failed: {}", e)))
    }

    /// Generate a JWT for a user
    fn generate_jwt(&self, user_id: Uuid) -> Result<AuthToken, AuthError> {
        let now = Utc::now();
        let expiration = now + self.settings.token_ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::InternalError(format!("Token generation failed: {}", e)))?;

        Ok(AuthToken::bearer(token, expiration))
    }

    /// Decode and validate a JWT
    fn decode_jwt(&self, token: &str) -> Result<Uuid, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.settings.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Uuid::parse_str(&token_data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, request: CreateUserRequest) -> Result<User, AuthError> {
        let password_hash = hash_password(&request.password, self.settings.bcrypt_cost)
            .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {}", e)))?;

        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
            password_hash,
            salary: request.salary,
            created_at: Utc::now(),
        };
        let default_category = Category::default_for(user.id, &self.settings.default_category);

        let user = self.user_repository.create(user, default_category).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    async fn login(&self, request: LoginRequest) -> Result<AuthToken, AuthError> {
        let Some(user) = self
            .user_repository
            .find_by_username(&request.username)
            .await?
        else {
            tracing::warn!(username = %request.username, "login for unknown user");
            let _ = verify(&request.password, &self.dummy_hash);
            return Err(AuthError::InvalidCredentials);
        };

        if !Self::verify_password(&request.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.generate_jwt(user.id)
    }

    async fn validate_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let user_id = self.decode_jwt(token)?;

        match self.user_repository.find_by_id(user_id).await? {
            Some(user) => Ok(user.id),
            None => {
                tracing::warn!(user_id = %user_id, "token for a user that no longer exists");
                Err(AuthError::InvalidToken)
            }
        }
    }
}
