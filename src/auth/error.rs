use thiserror::Error;

/// Failures surfaced by a [`UserRepository`](super::repo::UserRepository).
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Closed set of outcomes for registration, login and token checks.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RepoError> for AuthError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::DuplicateEmail => AuthError::DuplicateEmail,
            RepoError::NotFound => AuthError::NotFound,
            RepoError::Storage(e) => AuthError::Storage(e),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidSignature,
        }
    }
}
