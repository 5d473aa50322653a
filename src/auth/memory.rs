use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{
    error::RepoError,
    repo::UserRepository,
    repo_types::{NewUser, User},
};

/// In-process store for tests. Mirrors the Postgres rules: unique email among
/// live rows, lookups skip soft-deleted rows.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn soft_delete(&self, id: i64) {
        let mut users = self.users.lock().unwrap();
        if let Some(u) = users.iter_mut().find(|u| u.id == id) {
            u.deleted_at = Some(OffsetDateTime::now_utc());
        }
    }

    pub fn stored(&self, id: i64) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    fn live(users: &[User], pred: impl Fn(&User) -> bool) -> Option<User> {
        users
            .iter()
            .find(|u| u.deleted_at.is_none() && pred(u))
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if Self::live(&users, |u| u.email == user.email).is_some() {
            return Err(RepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: users.len() as i64 + 1,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        let users = self.users.lock().unwrap();
        Self::live(&users, |u| u.email == email).ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, RepoError> {
        let users = self.users.lock().unwrap();
        Self::live(&users, |u| u.id == id).ok_or(RepoError::NotFound)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(Self::live(&users, |u| u.email == email).is_some())
    }
}

/// Store whose every call fails at the storage layer.
pub struct FailingUserRepository;

#[async_trait]
impl UserRepository for FailingUserRepository {
    async fn create(&self, _user: NewUser) -> Result<User, RepoError> {
        Err(RepoError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn find_by_email(&self, _email: &str) -> Result<User, RepoError> {
        Err(RepoError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn find_by_id(&self, _id: i64) -> Result<User, RepoError> {
        Err(RepoError::Storage(sqlx::Error::PoolTimedOut))
    }
    async fn exists_by_email(&self, _email: &str) -> Result<bool, RepoError> {
        Err(RepoError::Storage(sqlx::Error::PoolTimedOut))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$x".into(),
            name: "Someone".into(),
        }
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_invisible_and_free_their_email() {
        let repo = InMemoryUserRepository::new();
        let first = repo.create(new_user("a@example.com")).await.expect("create");
        repo.soft_delete(first.id);

        assert!(matches!(repo.find_by_id(first.id).await, Err(RepoError::NotFound)));
        assert!(!repo.exists_by_email("a@example.com").await.expect("exists"));

        let second = repo.create(new_user("a@example.com")).await.expect("re-create");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn duplicate_live_email_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("a@example.com")).await.expect("create");
        assert!(matches!(
            repo.create(new_user("a@example.com")).await,
            Err(RepoError::DuplicateEmail)
        ));
        assert_eq!(repo.len(), 1);
    }
}
