//! Users repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::{query::SortField, update_row, Crud, Entity, PgRepository};
use crate::{
    error::AppResult,
    models::{
        query::SqlValue,
        user::{NewUser, User, UserChanges, UserQuery},
    },
};

impl Entity for User {
    type Id = i64;
    type Query = UserQuery;
    type Create = NewUser;
    type Update = UserChanges;

    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";
    const SORTABLE: &'static [SortField] = &[
        SortField::column("id"),
        SortField::column("name"),
        SortField::column("email"),
        SortField::column("role"),
        SortField::column("created_at"),
    ];

    fn insert_values(data: &NewUser) -> Vec<(&'static str, SqlValue)> {
        let mut values = vec![
            ("name", data.name.trim().into()),
            ("email", data.email.trim().to_lowercase().into()),
            ("password", data.password_hash.as_str().into()),
            ("role", data.role.into()),
            ("status", true.into()),
        ];
        if let Some(ref phone) = data.phone {
            values.push(("phone", phone.as_str().into()));
        }
        values
    }

    fn update_values(data: &UserChanges) -> Vec<(&'static str, SqlValue)> {
        let mut values = Vec::new();
        if let Some(ref name) = data.name {
            values.push(("name", name.trim().into()));
        }
        if let Some(ref email) = data.email {
            values.push(("email", email.trim().to_lowercase().into()));
        }
        if let Some(ref hash) = data.password_hash {
            values.push(("password", hash.as_str().into()));
        }
        if let Some(ref phone) = data.phone {
            values.push(("phone", phone.as_str().into()));
        }
        values
    }
}

#[derive(Clone)]
pub struct UsersRepository {
    inner: PgRepository<User>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            inner: PgRepository::new(pool),
        }
    }

    fn pool(&self) -> &Pool<Postgres> {
        self.inner.pool()
    }

    pub async fn create(&self, user: &NewUser) -> AppResult<User> {
        self.inner.create(user).await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        self.inner.get_by_id(&id).await
    }

    pub async fn update(&self, id: i64, changes: &UserChanges) -> AppResult<User> {
        self.inner.update(&id, changes).await
    }

    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.inner.get_paginated(query).await
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    /// Check if email already exists
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id != $2)")
                .bind(email.trim())
                .bind(id)
                .fetch_one(self.pool())
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email.trim())
                .fetch_one(self.pool())
                .await?
        };
        Ok(exists)
    }

    /// Store the hash of a password reset token
    pub async fn set_reset_token(
        &self,
        id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        update_row::<User, _>(
            self.pool(),
            &id,
            vec![
                ("reset_token_hash", token_hash.into()),
                ("reset_token_expires_at", expires_at.into()),
            ],
        )
        .await?;
        Ok(())
    }

    /// Find the user holding an unexpired reset token
    pub async fn get_by_reset_token(&self, token_hash: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE reset_token_hash = $1 AND reset_token_expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    /// Set a new password and consume the reset token
    pub async fn reset_password(&self, id: i64, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password = $1, reset_token_hash = NULL, reset_token_expires_at = NULL, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
