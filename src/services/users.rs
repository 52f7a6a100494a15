//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{
        ForgotPasswordRequest, LoginRequest, NewUser, RegisterRequest, ResetPasswordRequest,
        Role, TokenKind, TokenResponse, UpdateProfile, User, UserChanges, UserClaims, UserQuery,
    },
    repository::Repository,
    services::email::EmailService,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    email: EmailService,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, email: EmailService) -> Self {
        Self {
            repository,
            config,
            email,
        }
    }

    /// Register a new buyer account
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        if self.repository.users.email_exists(&request.email, None).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = NewUser {
            name: request.name,
            email: request.email,
            password_hash: hash_password(&request.password)?,
            phone: request.phone,
            role: Role::Buyer,
        };

        // The existence check races with concurrent registrations; the unique index decides
        let user = self
            .repository
            .users
            .create(&user)
            .await
            .map_err(|e| e.on_unique_violation("Email already registered"))?;

        tracing::info!("Registered user {}", user.id);
        Ok(user)
    }

    /// Check credentials and issue a token pair
    pub async fn login(&self, request: &LoginRequest) -> AppResult<TokenResponse> {
        let user = self
            .repository
            .users
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&user, &request.password)? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        if !user.status {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        self.issue_tokens(&user)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        let claims = UserClaims::from_token(refresh_token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired refresh token".to_string()))?;

        if claims.kind != TokenKind::Refresh {
            return Err(AppError::Authentication("Not a refresh token".to_string()));
        }

        // Role and status are re-read so that changes apply at the next refresh
        let user = match self.repository.users.get_by_id(claims.user_id()).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        if !user.status {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        self.issue_tokens(&user)
    }

    /// Decode and check an access token
    pub fn authenticate(&self, token: &str) -> AppResult<UserClaims> {
        let claims = UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

        if claims.kind != TokenKind::Access {
            return Err(AppError::Authentication("Not an access token".to_string()));
        }

        Ok(claims)
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<User> {
        self.repository.users.get_by_id(user_id).await
    }

    /// Update own profile; changing the password requires the current one
    pub async fn update_profile(&self, user_id: i64, profile: UpdateProfile) -> AppResult<User> {
        let user = self.repository.users.get_by_id(user_id).await?;

        if let Some(ref email) = profile.email {
            if self.repository.users.email_exists(email, Some(user_id)).await? {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        let password_hash = match profile.new_password {
            Some(ref new_password) => {
                let current = profile.current_password.as_deref().ok_or_else(|| {
                    AppError::Validation("Current password required to change password".to_string())
                })?;
                if !verify_password(&user, current)? {
                    return Err(AppError::Authentication("Current password is incorrect".to_string()));
                }
                Some(hash_password(new_password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            name: profile.name,
            email: profile.email,
            password_hash,
            phone: profile.phone,
        };

        self.repository
            .users
            .update(user_id, &changes)
            .await
            .map_err(|e| e.on_unique_violation("Email already registered"))
    }

    /// Admin listing of accounts
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Start a password reset.
    ///
    /// Succeeds whether or not the address is registered, so the endpoint
    /// cannot be used to probe for accounts.
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> AppResult<()> {
        let Some(user) = self.repository.users.get_by_email(&request.email).await? else {
            tracing::info!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(self.config.reset_token_minutes);
        self.repository
            .users
            .set_reset_token(user.id, &hash_token(&token), expires_at)
            .await?;

        if let Err(e) = self
            .email
            .send_password_reset(&user.email, &token, self.config.reset_token_minutes)
            .await
        {
            tracing::error!("Could not send reset email to user {}: {}", user.id, e);
        }

        Ok(())
    }

    /// Consume a reset token and set a new password
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> AppResult<()> {
        let user = self
            .repository
            .users
            .get_by_reset_token(&hash_token(request.token.trim()))
            .await?
            .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))?;

        let password_hash = hash_password(&request.password)?;
        self.repository.users.reset_password(user.id, &password_hash).await?;

        tracing::info!("Password reset for user {}", user.id);
        Ok(())
    }

    fn issue_tokens(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now().timestamp();
        let access_ttl = self.config.access_token_minutes * 60;
        let refresh_ttl = self.config.refresh_token_hours * 3600;

        let claims = |kind, ttl| UserClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            kind,
            exp: now + ttl,
            iat: now,
        };

        let access_token = claims(TokenKind::Access, access_ttl)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;
        let refresh_token = claims(TokenKind::Refresh, refresh_ttl)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: access_ttl,
        })
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(user: &User, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 32 random bytes, hex encoded
fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Only the digest of a reset token is stored
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        let now = Utc::now();
        User {
            id: 1,
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            password: hash_password(password).unwrap(),
            phone: None,
            role: Role::Buyer,
            status: true,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_hash_and_verify() {
        let user = user_with_password("correct horse");
        assert!(user.password.starts_with("$argon2"));
        assert!(verify_password(&user, "correct horse").unwrap());
        assert!(!verify_password(&user, "battery staple").unwrap());
    }

    #[test]
    fn test_reset_token_shape() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);

        let digest = hash_token(&a);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, hash_token(&a));
        assert_ne!(digest, a);
    }
}
