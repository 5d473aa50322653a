use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{repo_types::User, services::is_valid_email};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Form body for registration. Missing fields deserialize as empty strings so
/// they surface as a validation message rather than a rejected body.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub name: String,
}

impl RegisterForm {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
        self.name = self.name.trim().to_string();
    }

    pub fn validate(&self) -> Result<(), FormProblem> {
        if self.email.is_empty() || self.password.is_empty() || self.name.is_empty() {
            return Err(FormProblem::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(FormProblem::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormProblem::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(FormProblem::PasswordMismatch);
        }
        Ok(())
    }
}

/// Form body for login.
#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn normalize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }
}

/// Why a submitted form was sent back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormProblem {
    MissingFields,
    InvalidEmail,
    PasswordTooShort,
    PasswordMismatch,
    EmailTaken,
    InvalidCredentials,
    Unexpected,
}

impl FormProblem {
    pub fn message(self) -> &'static str {
        match self {
            FormProblem::MissingFields => "Please fill in all fields.",
            FormProblem::InvalidEmail => "Please enter a valid email address.",
            FormProblem::PasswordTooShort => "Password must be at least 6 characters.",
            FormProblem::PasswordMismatch => "Passwords do not match.",
            FormProblem::EmailTaken => "This email is already in use.",
            FormProblem::InvalidCredentials => "Email or password is incorrect.",
            FormProblem::Unexpected => "Something went wrong. Please try again.",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            FormProblem::MissingFields
            | FormProblem::InvalidEmail
            | FormProblem::PasswordTooShort
            | FormProblem::PasswordMismatch => StatusCode::BAD_REQUEST,
            FormProblem::EmailTaken => StatusCode::CONFLICT,
            FormProblem::InvalidCredentials => StatusCode::UNAUTHORIZED,
            FormProblem::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Returned when a form is rejected. Echoes the non-sensitive input so the
/// form can be refilled; the password is never included.
#[derive(Debug, Serialize)]
pub struct FormErrorBody {
    pub error: &'static str,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str, confirm: &str, name: &str) -> RegisterForm {
        RegisterForm {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
            name: name.into(),
        }
    }

    #[test]
    fn register_validation_order() {
        assert_eq!(form("", "", "", "").validate(), Err(FormProblem::MissingFields));
        assert_eq!(
            form("not-an-email", "secret1", "secret1", "Kim").validate(),
            Err(FormProblem::InvalidEmail)
        );
        assert_eq!(
            form("a@example.com", "12345", "12345", "Kim").validate(),
            Err(FormProblem::PasswordTooShort)
        );
        assert_eq!(
            form("a@example.com", "123456", "1234567", "Kim").validate(),
            Err(FormProblem::PasswordMismatch)
        );
        assert_eq!(form("a@example.com", "123456", "123456", "Kim").validate(), Ok(()));
    }

    #[test]
    fn normalize_trims_and_lowercases_email() {
        let mut f = form("  Test@Example.COM ", "x", "x", "  Kim ");
        f.normalize();
        assert_eq!(f.email, "test@example.com");
        assert_eq!(f.name, "Kim");
    }

    #[test]
    fn error_body_never_carries_password() {
        let body = FormErrorBody {
            error: FormProblem::PasswordMismatch.message(),
            email: "a@example.com".into(),
            name: Some("Kim".into()),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["email"], "a@example.com");
        assert_eq!(json["name"], "Kim");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn public_user_hides_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: 7,
            email: "a@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            name: "Kim".into(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("a@example.com"));
        assert!(!json.contains("argon2"));
    }
}
