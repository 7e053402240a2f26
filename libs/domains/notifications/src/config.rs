use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use std::time::Duration;

/// Tunables for delivery, the delayed-dispatch worker and analytics.
#[derive(Debug, Clone)]
pub struct NotificationsConfig {
    /// Upper bound for a single provider call.
    pub provider_timeout: Duration,
    pub scheduler_poll_interval: Duration,
    /// Rows claimed per worker tick.
    pub scheduler_batch_size: u64,
    pub analytics_cache_ttl: Duration,
    /// Shown in email layouts and test messages.
    pub app_name: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            scheduler_poll_interval: Duration::from_millis(5000),
            scheduler_batch_size: 50,
            analytics_cache_ttl: Duration::from_secs(60),
            app_name: "Notifier".to_string(),
        }
    }
}

impl FromEnv for NotificationsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            provider_timeout: Duration::from_secs(env_parse("NOTIFY_PROVIDER_TIMEOUT_SECS", 10)?),
            scheduler_poll_interval: Duration::from_millis(env_parse(
                "NOTIFY_SCHEDULER_POLL_MS",
                5000,
            )?),
            scheduler_batch_size: env_parse("NOTIFY_SCHEDULER_BATCH", 50)?,
            analytics_cache_ttl: Duration::from_secs(env_parse(
                "NOTIFY_ANALYTICS_CACHE_TTL_SECS",
                60,
            )?),
            app_name: env_or_default("NOTIFY_APP_NAME", "Notifier"),
        };

        if config.provider_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "NOTIFY_PROVIDER_TIMEOUT_SECS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        if config.scheduler_poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "NOTIFY_SCHEDULER_POLL_MS".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }
        if config.scheduler_batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "NOTIFY_SCHEDULER_BATCH".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }
}
