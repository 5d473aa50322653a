use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use super::{claims::Claims, error::AuthError, repo_types::User};
use crate::config::JwtConfig;

/// Issues and verifies HS256 identity tokens.
///
/// Holds only the signing secret and lifetime, both fixed at construction,
/// so a single instance is shared by every request without locking.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(cfg.secret.as_bytes(), Duration::hours(cfg.expiry_hours))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims::for_user(user, now.unix_timestamp(), exp.unix_timestamp());
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("jwt encode failed: {e}")))?;
        debug!(user_id = user.id, exp = claims.exp, "jwt issued");
        Ok(token)
    }

    /// Checks signature then expiry. No lookup is made against the user store:
    /// a verified token is trusted for its whole lifetime.
    ///
    /// A token is valid only while `now < exp`; the library check alone would
    /// still accept it during the second that equals `exp`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let result = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(AuthError::from)
            .and_then(|data| {
                if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
                    Err(AuthError::Expired)
                } else {
                    Ok(data.claims)
                }
            });
        match result {
            Ok(claims) => {
                debug!(user_id = claims.user_id, "jwt verified");
                Ok(claims)
            }
            Err(err) => {
                warn!(reason = %err, "jwt rejected");
                Err(err)
            }
        }
    }
}
