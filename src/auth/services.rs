use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::auth::{
    claims::Claims,
    error::{AuthError, RepoError},
    jwt::TokenAuthority,
    password::PasswordHasher,
    repo::UserRepository,
    repo_types::{NewUser, User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Input to [`AuthService::register`]; the password is still plaintext here.
#[derive(Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Registration, login and token verification over an injected user store.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: TokenAuthority,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: TokenAuthority, hasher: PasswordHasher) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    pub fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    /// The existence pre-check only produces a friendlier early exit; two
    /// concurrent registrations can both pass it, and the store's unique
    /// constraint then rejects the loser with `DuplicateEmail`.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: Registration) -> Result<User, AuthError> {
        if self.users.exists_by_email(&input.email).await? {
            warn!("email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let hasher = self.hasher.clone();
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(e.into()))??;

        let user = self
            .users
            .create(NewUser {
                email: input.email,
                password_hash,
                name: input.name,
            })
            .await
            .map_err(|e| {
                if matches!(e, RepoError::DuplicateEmail) {
                    warn!("email taken between check and insert");
                }
                AuthError::from(e)
            })?;

        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let user = match self.users.find_by_email(email).await {
            Ok(u) => u,
            Err(RepoError::NotFound) => {
                let hasher = self.hasher.clone();
                let plain = password.to_owned();
                tokio::task::spawn_blocking(move || hasher.verify_decoy(&plain))
                    .await
                    .map_err(|e| AuthError::Internal(e.into()))?;
                warn!("login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let hasher = self.hasher.clone();
        let plain = password.to_owned();
        let stored = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&plain, &stored))
            .await
            .map_err(|e| AuthError::Internal(e.into()))?;

        match verified {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = user.id, "login invalid password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(user_id = user.id, error = %e, "stored password hash unreadable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let token = self.tokens.issue(&user)?;
        info!(user_id = user.id, "user logged in");
        Ok((user, token))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token)
    }

    pub async fn user_by_id(&self, id: i64) -> Result<User, AuthError> {
        Ok(self.users.find_by_id(id).await?)
    }
}
