use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{
    error::RepoError,
    repo_types::{NewUser, User},
};

/// Persistence for user credentials. Lookups ignore soft-deleted rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`RepoError::DuplicateEmail`] when the store's unique
    /// constraint rejects the insert.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<User, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<User, RepoError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => RepoError::DuplicateEmail,
        _ => RepoError::Storage(e),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)"#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        Ok(exists)
    }
}
