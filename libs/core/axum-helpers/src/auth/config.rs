use core_config::{ConfigError, FromEnv, env_parse, env_required};

pub const MIN_SECRET_LEN: usize = 32;

/// `JWT_SECRET` (required, at least 32 bytes) and `JWT_LEEWAY_SECS` (default 30).
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub leeway_secs: u64,
}

impl JwtConfig {
    /// # Panics
    /// If `secret` is shorter than [`MIN_SECRET_LEN`].
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(
            secret.len() >= MIN_SECRET_LEN,
            "JWT secret must be at least 32 characters"
        );
        Self {
            secret,
            leeway_secs: 30,
        }
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET".to_string(),
                details: format!(
                    "must be at least {MIN_SECRET_LEN} characters (got {})",
                    secret.len()
                ),
            });
        }

        Ok(Self {
            secret,
            leeway_secs: env_parse("JWT_LEEWAY_SECS", 30)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    #[should_panic(expected = "at least 32 characters")]
    fn new_rejects_short_secret() {
        JwtConfig::new("short");
    }

    #[test]
    fn from_env_reads_secret_and_leeway() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_LEEWAY_SECS", Some("5"))],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret, SECRET);
                assert_eq!(config.leeway_secs, 5);
            },
        );
    }

    #[test]
    fn from_env_requires_secret() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }

    #[test]
    fn from_env_rejects_short_secret() {
        temp_env::with_var("JWT_SECRET", Some("short"), || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("32 characters"));
        });
    }
}
