use serde::{Deserialize, Serialize};

use super::repo_types::User;

/// Identity claims carried inside the signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub iat: i64, // issued at (unix timestamp)
    pub exp: i64, // expires at (unix timestamp)
}

impl Claims {
    pub fn for_user(user: &User, iat: i64, exp: i64) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat,
            exp,
        }
    }
}
