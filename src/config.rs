use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub job_queue_size: usize,
    pub event_buffer_size: usize,
    /// Delay between consecutive automated decisions.
    pub batch_pacing: Duration,
    pub revenue_threshold: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            job_queue_size: parse_or_default("JOB_QUEUE_SIZE", 1024)?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            batch_pacing: Duration::from_millis(parse_or_default("BATCH_PACING_MS", 500)?),
            revenue_threshold: parse_or_default("REVENUE_THRESHOLD", 500.0)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Channel capacities must be non-zero; tokio panics on empty channels.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_queue_size == 0 {
            return Err(AppError::Internal(
                "invalid JOB_QUEUE_SIZE: must be greater than zero".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be greater than zero".to_string(),
            ));
        }
        if !self.revenue_threshold.is_finite() || self.revenue_threshold < 0.0 {
            return Err(AppError::Internal(
                "invalid REVENUE_THRESHOLD: must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
