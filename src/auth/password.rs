use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;

use rand::rngs::OsRng;
use tracing::error;

/// Salted Argon2id hashing for stored credentials.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Hash of a throwaway secret under the same params, burned on logins for
    // unknown emails so they cost as much as a wrong password.
    decoy: Arc<str>,
}

impl PasswordHasher {
    /// m=64MiB, t=3, p=4. Deliberately slow, on par with bcrypt cost 12.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_params(65536, 3, 4)
    }

    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> anyhow::Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let decoy = argon2
            .hash_password(b"decoy-password", &SaltString::generate(&mut OsRng))
            .map_err(|e| anyhow::anyhow!("argon2 decoy hash: {e}"))?
            .to_string();
        Ok(Self {
            argon2,
            decoy: decoy.into(),
        })
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Compares in constant time. Parameters are read from the stored hash,
    /// so hashes made under older settings keep verifying.
    pub fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Runs a full verification against the decoy hash and discards the
    /// outcome. Always reports no match.
    pub fn verify_decoy(&self, plain: &str) -> bool {
        let _ = self.verify(plain, &self.decoy);
        false
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(Params::MIN_M_COST, 1, 1).expect("min params are valid")
}
