use axum_helpers::JwtConfig;
use core_config::{Environment, FromEnv, server::ServerConfig};
use database::postgres::PostgresConfig;
use domain_notifications::NotificationsConfig;

/// Application configuration, composed from the shared config pieces.
#[derive(Clone, Debug)]
pub struct Config {
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub notifications: NotificationsConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            database: PostgresConfig::from_env()?, // Required - DATABASE_URL
            server: ServerConfig::from_env()?,     // HOST=0.0.0.0, PORT=8080 by default
            jwt: JwtConfig::from_env()?,           // Required - JWT_SECRET
            notifications: NotificationsConfig::from_env()?,
            environment: Environment::from_env(),
        })
    }
}
