//! PostgreSQL connection management for the notifier.
//!
//! - [`postgres`]: pool configuration, connecting (optionally with retry), migrations, health
//! - [`common`]: shared error type and the retry helper
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{PostgresConfig, connect_from_config_with_retry, run_migrations};
//!
//! let db = connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! run_migrations::<migration::Migrator>(&db, "notifier_api").await?;
//! ```

pub mod common;
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig};
