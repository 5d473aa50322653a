use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so parsing can be
    /// exercised without mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }

        let expiry_hours = match lookup("JWT_EXPIRY_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("JWT_EXPIRY_HOURS is not an integer: {raw:?}"))?,
            None => 24,
        };
        if expiry_hours <= 0 {
            bail!("JWT_EXPIRY_HOURS must be positive, got {expiry_hours}");
        }

        let cookie = CookieConfig {
            name: lookup("AUTH_COOKIE_NAME").unwrap_or_else(|| "auth_token".into()),
            secure: lookup("AUTH_COOKIE_SECURE")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        };

        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match lookup("APP_PORT") {
                Some(raw) => raw
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("APP_PORT is not a port number: {raw:?}"))?,
                None => 8080,
            },
        };

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a count: {raw:?}"))?,
            None => 10,
        };
        if db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        Ok(Self {
            database_url,
            db_max_connections,
            jwt: JwtConfig {
                secret,
                expiry_hours,
            },
            cookie,
            server,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key: &str| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults_applied_when_optional_vars_missing() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/dash"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.expiry_hours, 24);
        assert_eq!(cfg.cookie.name, "auth_token");
        assert!(!cfg.cookie.secure);
        assert_eq!(cfg.listen_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.db_max_connections, 10);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/dash"),
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRY_HOURS", "2"),
            ("AUTH_COOKIE_NAME", "session"),
            ("AUTH_COOKIE_SECURE", "true"),
            ("APP_PORT", "3000"),
            ("DB_MAX_CONNECTIONS", "25"),
        ]))
        .expect("config should load");

        assert_eq!(cfg.jwt.expiry_hours, 2);
        assert_eq!(cfg.cookie.name, "session");
        assert!(cfg.cookie.secure);
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.db_max_connections, 25);
    }

    #[test]
    fn rejects_missing_or_empty_secret() {
        assert!(AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", ""),
        ]))
        .is_err());
    }

    #[test]
    fn rejects_non_positive_or_garbage_expiry() {
        for bad in ["0", "-1", "soon"] {
            let res = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://x"),
                ("JWT_SECRET", "s3cret"),
                ("JWT_EXPIRY_HOURS", bad),
            ]));
            assert!(res.is_err(), "expiry {bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_or_garbage_pool_size() {
        for bad in ["0", "many", "-3"] {
            let res = AppConfig::from_lookup(lookup_from(&[
                ("DATABASE_URL", "postgres://x"),
                ("JWT_SECRET", "s3cret"),
                ("DB_MAX_CONNECTIONS", bad),
            ]));
            assert!(res.is_err(), "pool size {bad:?} should be rejected");
        }
    }
}
